use subtle::ConstantTimeEq;

/// Compares two secrets without short-circuiting on the first differing byte.
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
