//! Weighted accept-list parsing.

/// One entry of a parsed accept list: a mime range and its quality weight
/// scaled to 0..=1000 to keep ordering exact.
pub type AcceptEntry = (String, u16);

/// Parses an accept string such as `text/css, */*;q=0.1` into mime ranges
/// sorted by descending quality.
///
/// Quality defaults to 1.0 and is clamped to 0..=1.0. The sort is stable, so
/// ranges with equal quality keep their declared order. Entries with q=0 are
/// dropped (explicitly unacceptable).
pub fn parse_accept(accept: &str) -> Vec<AcceptEntry> {
    let mut entries: Vec<AcceptEntry> = accept
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let range = pieces.next()?.trim();
            if range.is_empty() {
                return None;
            }
            let mut quality = 1000u16;
            for param in pieces {
                if let Some(q) = param.trim().strip_prefix("q=") {
                    quality = q
                        .parse::<f32>()
                        .ok()
                        .map(|q| (q.clamp(0.0, 1.0) * 1000.0).round() as u16)
                        .unwrap_or(1000);
                }
            }
            (quality > 0).then(|| (range.to_string(), quality))
        })
        .collect();

    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}
