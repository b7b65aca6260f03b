//! American Soundex phonetic encoding
//!
//! Produces the classic first-letter-plus-digits code, in the unpadded
//! variant used for blocking signatures: trailing zeros are not appended,
//! so "Wang" encodes to "W52" rather than "W520". Codes are capped at
//! four characters.

/// Encode a string to its unpadded Soundex code.
///
/// Returns an empty string for empty input or input containing no
/// alphabetic characters.
///
/// # Examples
/// ```
/// use blockrust::signature::soundex;
/// assert_eq!(soundex("Robert"), "R163");
/// assert_eq!(soundex("Joyce"), "J2");
/// assert_eq!(soundex(""), "");
/// ```
#[must_use]
pub fn soundex(s: &str) -> String {
    let s = s.trim().to_uppercase();

    let chars: Vec<char> = s.chars().filter(|c| c.is_ascii_alphabetic()).collect();

    if chars.is_empty() {
        return String::new();
    }

    let first = chars[0];

    let encode_char = |c: char| -> char {
        match c {
            'B' | 'F' | 'P' | 'V' => '1',
            'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => '2',
            'D' | 'T' => '3',
            'L' => '4',
            'M' | 'N' => '5',
            'R' => '6',
            _ => '0', // A, E, I, O, U, H, W, Y
        }
    };

    // H and W are ignored entirely and do not break code adjacency
    let is_hw = |c: char| -> bool { matches!(c, 'H' | 'W') };

    let mut result = String::with_capacity(4);
    result.push(first);

    let mut prev_code = encode_char(first);

    for &c in &chars[1..] {
        if result.len() >= 4 {
            break;
        }

        let code = encode_char(c);

        if is_hw(c) {
            continue;
        }

        // Skip if same as previous or if it's a vowel (code 0)
        if code != '0' && code != prev_code {
            result.push(code);
        }

        // Vowels (code 0) break adjacency, H/W don't (handled above)
        prev_code = code;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soundex_classic_names() {
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("Ashcraft"), "A261");
        assert_eq!(soundex("Ashcroft"), "A261");
    }

    #[test]
    fn test_soundex_unpadded() {
        assert_eq!(soundex("Joyce"), "J2");
        assert_eq!(soundex("Wang"), "W52");
        assert_eq!(soundex("Yu"), "Y");
    }

    #[test]
    fn test_soundex_same_code() {
        assert_eq!(soundex("Smith"), soundex("Smyth"));
    }

    #[test]
    fn test_soundex_empty_and_non_alphabetic() {
        assert_eq!(soundex(""), "");
        assert_eq!(soundex("  "), "");
        assert_eq!(soundex("2134"), "");
    }

    #[test]
    fn test_soundex_case_insensitive() {
        assert_eq!(soundex("wang"), soundex("WANG"));
    }
}
