/// Checks a candidate password, returning the first rule it breaks.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if len < 8 {
        return Err("Password must be longer than 8 characters");
    }
    if len > 72 {
        return Err("Password must be less than 72 characters");
    }
    if password.starts_with(char::is_whitespace) || password.ends_with(char::is_whitespace) {
        return Err("Password must not start or end with empty spaces");
    }

    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_alphanumeric());
    if !(has_upper && has_lower && has_digit && has_special) {
        return Err("Password must contain 1 upper case, lower case, number and special character");
    }
    Ok(())
}
