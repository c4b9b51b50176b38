//! Checksum validation for the 10-digit national identity number (cédula)

/// Coefficients applied to the first nine digits of the cédula
const COEFFICIENTS: [u32; 9] = [2, 1, 2, 1, 2, 1, 2, 1, 2];

/// Outcome of validating a single cédula
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CedulaCheck {
    pub valid: bool,
    pub message: String,
}

impl CedulaCheck {
    fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Validate a cédula string
///
/// Non-digit characters are stripped before validation, so formatted input
/// like "171003406-5" is accepted. Checks, in order:
/// 1. Exactly 10 digits remain after stripping
/// 2. Digits 0-1 form a province code in 1..=24
/// 3. Digit 2 is below 6 (natural person type code)
/// 4. Digit 9 equals the weighted mod-10 check digit over digits 0-8
pub fn validate_cedula(input: &str) -> CedulaCheck {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 10 {
        return CedulaCheck::fail("cédula must have exactly 10 digits");
    }

    let province = digits[0] * 10 + digits[1];
    if !(1..=24).contains(&province) {
        return CedulaCheck::fail(format!("cédula province code {:02} is invalid", province));
    }

    if digits[2] >= 6 {
        return CedulaCheck::fail(format!("cédula type digit {} is invalid", digits[2]));
    }

    let sum: u32 = COEFFICIENTS
        .iter()
        .zip(&digits[..9])
        .map(|(coefficient, digit)| {
            let product = coefficient * digit;
            if product > 9 { product - 9 } else { product }
        })
        .sum();

    let expected = if sum % 10 == 0 { 0 } else { 10 - sum % 10 };
    if digits[9] != expected {
        return CedulaCheck::fail("cédula check digit does not match");
    }

    CedulaCheck::ok()
}
