use chrono::{DateTime, Utc};
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization as _;

use crate::model::{NewBook, NewContactSubmission};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Invalid email address.";
pub const ONLY_PDF: &str = "Only PDF files are allowed!";
pub const INVALID_CSRF: &str = "The CSRF token is missing or invalid.";

/// Used when sanitizing strips an upload name down to nothing.
pub const FALLBACK_UPLOAD_NAME: &str = "upload.pdf";

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |err| err.field == field)
            .map(|err| err.message.as_str())
    }

    pub fn has(&self, field: &str) -> bool {
        self.for_field(field).next().is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|err| err.field)
    }
}

/// Required text: blank (after trimming) stops further checks on the field.
fn required(errors: &mut FormErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.push(field, REQUIRED);
        return false;
    }
    true
}

fn length(errors: &mut FormErrors, field: &'static str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        let message = if min == 0 {
            format!("Field cannot be longer than {max} characters.")
        } else {
            format!("Field must be between {min} and {max} characters long.")
        };
        errors.push(field, message);
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub csrf_token: String,
}

impl ContactInput {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();

        if required(&mut errors, "name", &self.name) {
            length(&mut errors, "name", &self.name, 2, 100);
        }
        if required(&mut errors, "email", &self.email) && !is_valid_email(&self.email) {
            errors.push("email", INVALID_EMAIL);
        }
        length(&mut errors, "subject", &self.subject, 0, 200);
        if required(&mut errors, "message", &self.message) {
            length(&mut errors, "message", &self.message, 10, 1000);
        }

        errors
    }

    pub fn into_submission(self, submitted_at: DateTime<Utc>) -> NewContactSubmission {
        NewContactSubmission {
            subject: optional(&self.subject),
            name: self.name,
            email: self.email,
            message: self.message,
            submitted_at,
        }
    }
}

/// Text fields of the upload form; echoed back when the form is re-rendered.
#[derive(Debug, Clone, Default)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name as sent by the browser. Never used for disk access.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl BookFields {
    pub fn validate(&self, file: Option<&UploadedFile>) -> FormErrors {
        let mut errors = FormErrors::default();

        if required(&mut errors, "title", &self.title) {
            length(&mut errors, "title", &self.title, 2, 200);
        }
        if required(&mut errors, "author", &self.author) {
            length(&mut errors, "author", &self.author, 2, 100);
        }
        length(&mut errors, "description", &self.description, 0, 500);

        match file {
            Some(file) if !file.file_name.is_empty() => {
                if !has_pdf_extension(&file.file_name) {
                    errors.push("file", ONLY_PDF);
                }
            }
            _ => errors.push("file", REQUIRED),
        }

        errors
    }

    pub fn into_book(
        self,
        file: &UploadedFile,
        stored_name: String,
        uploaded_at: DateTime<Utc>,
    ) -> NewBook {
        NewBook {
            description: optional(&self.description),
            title: self.title,
            author: self.author,
            filename: stored_name,
            original_filename: sanitize_filename(&file.file_name),
            uploaded_at,
        }
    }
}

/// Extension check only; the bytes are not inspected.
pub fn has_pdf_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c));
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || domain.len() > 253 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| !tld.chars().all(|c| c.is_ascii_digit()));

    labels_ok && tld_ok
}

/// Reduces a user-supplied file name to `[A-Za-z0-9_.-]`, safe to show and
/// store. Accented letters fold to their base letter (NFKD); path separators
/// and whitespace runs become `_`.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .nfkd()
        .filter(|c| c.is_ascii())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        return FALLBACK_UPLOAD_NAME.to_string();
    }

    let stem = trimmed
        .split('.')
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactInput {
        ContactInput {
            name: "Meena".to_string(),
            email: "meena@example.com".to_string(),
            subject: String::new(),
            message: "I would like to submit a poem.".to_string(),
            csrf_token: String::new(),
        }
    }

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    fn book() -> BookFields {
        BookFields {
            title: "Poems".to_string(),
            author: "A. Kavi".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn valid_contact_has_no_errors() {
        assert!(contact().validate().is_empty());
    }

    #[test]
    fn blank_name_reports_required_only() {
        let input = ContactInput {
            name: "   ".to_string(),
            ..contact()
        };
        let errors = input.validate();
        assert_eq!(errors.for_field("name").collect::<Vec<_>>(), [REQUIRED]);
    }

    #[test]
    fn contact_length_limits_count_characters() {
        let input = ContactInput {
            name: "M".to_string(),
            subject: "s".repeat(201),
            message: "short".to_string(),
            ..contact()
        };
        let errors = input.validate();
        assert_eq!(
            errors.for_field("name").collect::<Vec<_>>(),
            ["Field must be between 2 and 100 characters long."]
        );
        assert_eq!(
            errors.for_field("subject").collect::<Vec<_>>(),
            ["Field cannot be longer than 200 characters."]
        );
        assert!(errors.has("message"));

        // Ten multi-byte characters are a valid message.
        let input = ContactInput {
            message: "வெண்பாவெண்பாவெ".chars().take(10).collect(),
            ..contact()
        };
        assert!(!input.validate().has("message"));
    }

    #[test]
    fn email_shapes() {
        for ok in ["a@b.co", "first.last+tag@mail.example.org", "x_y@sub-domain.example.in"] {
            assert!(is_valid_email(ok), "{ok}");
        }
        for bad in [
            "plainaddress",
            "@example.com",
            "a@",
            "a@localhost",
            "a b@example.com",
            "a..b@example.com",
            "a@-example.com",
            "a@example..com",
            "a@example.123",
        ] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn empty_subject_is_stored_as_null() {
        let submission = contact().into_submission(Utc::now());
        assert_eq!(submission.subject, None);
    }

    #[test]
    fn upload_requires_pdf_extension_case_insensitively() {
        assert!(book().validate(Some(&pdf("Sample.PDF"))).is_empty());
        assert_eq!(
            book()
                .validate(Some(&pdf("notes.docx")))
                .for_field("file")
                .collect::<Vec<_>>(),
            [ONLY_PDF]
        );
        assert!(book().validate(Some(&pdf("pdf"))).has("file"));
    }

    #[test]
    fn upload_without_file_is_required_error() {
        let errors = book().validate(None);
        assert_eq!(errors.for_field("file").collect::<Vec<_>>(), [REQUIRED]);
        assert!(book().validate(Some(&pdf(""))).has("file"));
    }

    #[test]
    fn upload_text_limits() {
        let fields = BookFields {
            title: "P".to_string(),
            author: String::new(),
            description: "d".repeat(501),
        };
        let errors = fields.validate(Some(&pdf("a.pdf")));
        let mut fields: Vec<_> = errors.fields().collect();
        fields.sort_unstable();
        assert_eq!(fields, ["author", "description", "title"]);
    }

    #[test]
    fn sanitize_strips_paths_and_unsafe_characters() {
        assert_eq!(sanitize_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("My cool book.pdf"), "My_cool_book.pdf");
        assert_eq!(sanitize_filename("C:\\Users\\me\\poems.pdf"), "C_Users_me_poems.pdf");
        assert_eq!(sanitize_filename("<script>.pdf"), "script.pdf");
        assert_eq!(sanitize_filename("வெண்பா.pdf"), "pdf");
        assert_eq!(sanitize_filename("café crème.pdf"), "cafe_creme.pdf");
        assert_eq!(sanitize_filename("ﬁnal.pdf"), "final.pdf");
        assert_eq!(sanitize_filename("..."), FALLBACK_UPLOAD_NAME);
        assert_eq!(sanitize_filename("con.pdf"), "_con.pdf");
    }

    #[test]
    fn into_book_keeps_stored_and_original_names_apart() {
        let book = book().into_book(&pdf("my poems.pdf"), "abc.pdf".to_string(), Utc::now());
        assert_eq!(book.filename, "abc.pdf");
        assert_eq!(book.original_filename, "my_poems.pdf");
        assert_eq!(book.description, None);
    }
}
