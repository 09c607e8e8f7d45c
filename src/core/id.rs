//! Record identifier generation.

use rand::Rng;

const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LENGTH: usize = 9;

/// Generates a record id: the current time in milliseconds in base 36,
/// followed by nine random base-36 characters.
#[must_use]
pub fn generate_id() -> String {
    let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
    let mut id = to_base36(millis);

    let mut rng = rand::thread_rng();
    for _ in 0..RANDOM_SUFFIX_LENGTH {
        let digit = rng.gen_range(0..BASE36_DIGITS.len());
        id.push(char::from(BASE36_DIGITS[digit]));
    }
    id
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        // value % 36 < 36, always a valid index
        #[allow(clippy::cast_possible_truncation)]
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn test_generated_ids_are_distinct_and_base36() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(a.len() > RANDOM_SUFFIX_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
