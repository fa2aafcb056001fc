use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Rounds to three decimal places, the precision result scores are reported at.
pub fn round3(value: f32) -> f32 {
    ((value as f64 * 1000.0).round() / 1000.0) as f32
}

/// Trims `text` to at most `max_chars` characters, appending an ellipsis when cut.
pub fn shorten(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_owned();
    }

    let mut out = trimmed
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

/// Two pseudo-random components in `[-1, 1]`, stable for a given key.
///
/// `DefaultHasher::new()` uses fixed keys, so the result does not change
/// between runs of the same build.
pub fn stable_pair<K: Hash + ?Sized>(key: &K) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
