use std::fmt;

#[derive(Debug)]
pub enum Validity {
    Valid,
    Invalid(String),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        match &self {
            Validity::Valid => true,
            Validity::Invalid(_) => false,
        }
    }
}

pub fn validate_email_address(email: &str) -> Validity {
    if email.chars().count() > 320 {
        return Validity::Invalid(String::from("Email address is too long."));
    }

    for c in email.chars() {
        if c == ' ' || !c.is_ascii() {
            return Validity::Invalid(String::from(
                "Email address cannot contain a space or non-ASCII characters.",
            ));
        }
    }

    if email.contains("@.") {
        return Validity::Invalid(String::from(
            "Domain name in email address cannot begin with a period.",
        ));
    }

    let email = match email.split_once('@') {
        Some(s) => s,
        None => {
            return Validity::Invalid(String::from("Email address must contain an at symbol (@)."))
        }
    };

    if email.0.is_empty() || email.1.len() < 3 {
        return Validity::Invalid(String::from("Email username or domain name is too short."));
    }

    if email.1.contains('@') || !email.1.contains('.') {
        return Validity::Invalid(String::from(
            "Email address must have only one at symbol (@) and the domain must contain a period.",
        ));
    }

    if email.1.ends_with('.') {
        return Validity::Invalid(String::from("Email address cannot end with a period."));
    }

    Validity::Valid
}

/// E.164: a plus sign followed by 8 to 15 digits, the first of which is not zero.
pub fn validate_phone_number(phone: &str) -> Validity {
    let Some(digits) = phone.strip_prefix('+') else {
        return Validity::Invalid(String::from(
            "Phone number must begin with a plus sign (+) and country code.",
        ));
    };

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Validity::Invalid(String::from(
            "Phone number can only contain digits after the plus sign.",
        ));
    }

    if digits.len() < 8 || digits.len() > 15 {
        return Validity::Invalid(String::from(
            "Phone number must have between 8 and 15 digits.",
        ));
    }

    if digits.starts_with('0') {
        return Validity::Invalid(String::from("Country code cannot begin with zero."));
    }

    Validity::Valid
}

/// Who an OTP is addressed to. The variant decides the delivery channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identifier {
    Email(String),
    Phone(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidIdentifier(pub String);

impl std::error::Error for InvalidIdentifier {}

impl fmt::Display for InvalidIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Identifier {
    /// Anything containing an at symbol is treated as an email address (lowercased),
    /// everything else as a phone number.
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
        let raw = raw.trim();

        if raw.is_empty() {
            return Err(InvalidIdentifier(String::from(
                "An email address or phone number is required.",
            )));
        }

        if raw.contains('@') {
            let email = raw.to_ascii_lowercase();
            match validate_email_address(&email) {
                Validity::Valid => Ok(Identifier::Email(email)),
                Validity::Invalid(msg) => Err(InvalidIdentifier(msg)),
            }
        } else {
            match validate_phone_number(raw) {
                Validity::Valid => Ok(Identifier::Phone(String::from(raw))),
                Validity::Invalid(msg) => Err(InvalidIdentifier(msg)),
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Identifier::Email(email) => email,
            Identifier::Phone(phone) => phone,
        }
    }
}
