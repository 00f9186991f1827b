/// Normalizes a name by stripping surrounding whitespace and composing
/// it into Unicode Normalization Form C.
///
/// ```
/// use chart_backend::normalization::normalize_name;
/// assert_eq!(normalize_name(" Aśha\u{0304} "), "Aśhā");
/// ```
pub fn normalize_name(name: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    name.as_ref().trim().nfc().collect()
}
