use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

pub fn format_price(price: f64) -> String {
  format!("${price:.2}")
}

/// Escapes text for interpolation into HTML bodies and attribute values.
pub fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for ch in text.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      _ => out.push(ch),
    }
  }
  out
}

/// Basic shape check, the same bar the signup form has always used.
pub fn is_valid_email(email: &str) -> bool {
  email.contains('@') && email.contains('.')
}

/// Reduces an uploaded file name to `[A-Za-z0-9._-]`, stripping any
/// directory components and leading dots.
pub fn sanitize_filename(name: &str) -> String {
  let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

  let cleaned: String = base
    .chars()
    .map(|ch| {
      if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
        ch
      } else if ch.is_whitespace() {
        '_'
      } else {
        '\0'
      }
    })
    .filter(|&ch| ch != '\0')
    .collect();

  cleaned.trim_start_matches('.').to_string()
}

pub const SLIP_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "pdf", "gif"];

/// Lowercased extension of `name` when it is an accepted slip type.
pub fn slip_extension(name: &str) -> Option<String> {
  let (_, ext) = name.rsplit_once('.')?;
  let ext = ext.to_ascii_lowercase();
  SLIP_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// On-disk form of an uploaded slip name. Only the stem is sanitized, so the
/// extension survives names written entirely in non-ASCII script.
pub fn slip_file_name(name: &str, ext: &str) -> String {
  let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
  let stem = sanitize_filename(stem);
  let stem = stem.trim_end_matches('.');

  if stem.is_empty() { format!("slip.{ext}") } else { format!("{stem}.{ext}") }
}

/// A stored slip name is a single path component.
pub fn is_plain_filename(name: &str) -> bool {
  !name.is_empty()
    && !name.contains(['/', '\\'])
    && name != "."
    && name != ".."
    && !name.starts_with('.')
}
