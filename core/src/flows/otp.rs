// grocer/src/flows/otp.rs

use rand_core::{OsRng, RngCore};

pub const OTP_LENGTH: usize = 4;

/// Fresh 4-digit delivery code, zero padded.
pub fn generate_delivery_otp() -> String {
  format!("{:04}", OsRng.next_u32() % 10_000)
}

pub fn is_well_formed(code: &str) -> bool {
  code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generated_codes_are_well_formed() {
    for _ in 0..200 {
      let code = generate_delivery_otp();
      assert!(is_well_formed(&code), "bad code {code}");
    }
  }

  #[test]
  fn rejects_malformed_codes() {
    assert!(!is_well_formed("123"));
    assert!(!is_well_formed("12345"));
    assert!(!is_well_formed("12a4"));
    assert!(!is_well_formed(" 123"));
    assert!(is_well_formed("0007"));
  }
}
