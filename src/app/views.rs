use maud::{DOCTYPE, Markup, html};

use crate::model::Book;
use crate::session::Flash;
use crate::validation::{BookFields, ContactInput, FormErrors};

const SITE_NAME: &str = "Venbaah";

const NAV: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/archives", "Archives"),
    ("/editorial", "Editorial Board"),
    ("/manuscript", "Submit a Manuscript"),
    ("/policies", "Policies"),
    ("/upload-book", "Upload a Book"),
    ("/contact", "Contact"),
];

pub fn layout(title: &str, flash: Option<&Flash>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | " (SITE_NAME) }
                link rel="stylesheet" href="/static/css/style.css";
            }
            body {
                header.site-header {
                    a.brand href="/" { (SITE_NAME) }
                    nav {
                        ul {
                            @for (href, label) in NAV {
                                li { a href=(href) { (label) } }
                            }
                        }
                    }
                }
                main {
                    @if let Some(flash) = flash {
                        div class={ "flash flash-" (flash.kind.as_str()) } role="status" {
                            (flash.message)
                        }
                    }
                    (body)
                }
                footer.site-footer {
                    p { "© " (SITE_NAME) " Literary Magazine" }
                }
            }
        }
    }
}

fn book_card(book: &Book) -> Markup {
    html! {
        article.book data-book-id=(book.id) {
            h3.book-title { (book.title) }
            p.book-author { "by " (book.author) }
            @if let Some(description) = &book.description {
                p.book-description { (description) }
            }
            p.book-meta {
                "Uploaded " time datetime=(book.uploaded_at.to_rfc3339()) {
                    (book.uploaded_at.format("%B %-d, %Y").to_string())
                }
                " · " (book.original_filename)
            }
            p.book-actions {
                a href={ "/view/" (book.filename) } target="_blank" { "Read online" }
                " "
                a href={ "/download/" (book.filename) } { "Download PDF" }
            }
        }
    }
}

pub fn home(featured: &[Book]) -> Markup {
    html! {
        section.hero {
            h1 { "Welcome to " (SITE_NAME) }
            p {
                "A literary magazine for poetry, short fiction and criticism. "
                "Browse the archive, read new books online, or send us your work."
            }
        }
        section.featured {
            h2 { "Featured books" }
            @if featured.is_empty() {
                p.empty { "No books have been uploaded yet." }
            } @else {
                @for book in featured {
                    (book_card(book))
                }
            }
            p { a href="/archives" { "See the full archive" } }
        }
    }
}

pub fn archives(books: &[Book]) -> Markup {
    html! {
        h1 { "Archives" }
        @if books.is_empty() {
            p.empty {
                "The archive is empty. "
                a href="/upload-book" { "Upload the first book." }
            }
        } @else {
            p.count { (books.len()) " books" }
            @for book in books {
                (book_card(book))
            }
        }
    }
}

pub fn editorial() -> Markup {
    html! {
        h1 { "Editorial Board" }
        p {
            "Our editors read every submission. The board meets each month to "
            "select work for the coming issue and to plan special collections."
        }
        h2 { "What we look for" }
        ul {
            li { "Poetry in traditional and free forms" }
            li { "Short fiction under 5,000 words" }
            li { "Essays and criticism on literature old and new" }
            li { "Translations, with the rights holder's permission" }
        }
    }
}

pub fn manuscript() -> Markup {
    html! {
        h1 { "Submit a Manuscript" }
        p {
            "We welcome unpublished work. Send your manuscript as a single PDF "
            "through the " a href="/upload-book" { "upload form" } ", or write to us "
            "through the " a href="/contact" { "contact page" } " with questions."
        }
        h2 { "Guidelines" }
        ol {
            li { "Include the title and author name on the first page." }
            li { "Files must be PDF and no larger than 16 MB." }
            li { "Simultaneous submissions are fine; tell us if the work is accepted elsewhere." }
            li { "Expect a response within eight weeks." }
        }
    }
}

pub fn policies() -> Markup {
    html! {
        h1 { "Policies" }
        h2 { "Copyright" }
        p {
            "Authors keep the copyright to their work. By uploading, you grant "
            (SITE_NAME) " the right to publish the work in its online archive."
        }
        h2 { "Privacy" }
        p {
            "Messages sent through the contact form are read only by the editorial "
            "staff and are never shared with third parties."
        }
        h2 { "Corrections" }
        p {
            "If you find an error in a published piece, please let us know through the "
            "contact page."
        }
    }
}

fn field_errors(errors: &FormErrors, field: &str) -> Markup {
    html! {
        @for message in errors.for_field(field) {
            span.field-error data-field=(field) { (message) }
        }
    }
}

fn form_errors(errors: &FormErrors) -> Markup {
    html! {
        @if errors.has("csrf_token") {
            div.form-error role="alert" { (field_errors(errors, "csrf_token")) }
        }
    }
}

pub fn contact(input: &ContactInput, errors: &FormErrors, csrf_token: &str) -> Markup {
    html! {
        h1 { "Contact us" }
        (form_errors(errors))
        form method="post" action="/contact" novalidate {
            input type="hidden" name="csrf_token" value=(csrf_token);
            div.field {
                label for="name" { "Name" }
                input id="name" type="text" name="name" value=(input.name) required;
                (field_errors(errors, "name"))
            }
            div.field {
                label for="email" { "Email" }
                input id="email" type="email" name="email" value=(input.email) required;
                (field_errors(errors, "email"))
            }
            div.field {
                label for="subject" { "Subject" }
                input id="subject" type="text" name="subject" value=(input.subject);
                (field_errors(errors, "subject"))
            }
            div.field {
                label for="message" { "Message" }
                textarea id="message" name="message" rows="8" required { (input.message) }
                (field_errors(errors, "message"))
            }
            button type="submit" { "Send Message" }
        }
    }
}

pub fn upload_book(fields: &BookFields, errors: &FormErrors, csrf_token: &str) -> Markup {
    html! {
        h1 { "Upload a Book" }
        (form_errors(errors))
        form method="post" action="/upload-book" enctype="multipart/form-data" novalidate {
            input type="hidden" name="csrf_token" value=(csrf_token);
            div.field {
                label for="title" { "Book Title" }
                input id="title" type="text" name="title" value=(fields.title) required;
                (field_errors(errors, "title"))
            }
            div.field {
                label for="author" { "Author" }
                input id="author" type="text" name="author" value=(fields.author) required;
                (field_errors(errors, "author"))
            }
            div.field {
                label for="description" { "Description" }
                textarea id="description" name="description" rows="5" { (fields.description) }
                (field_errors(errors, "description"))
            }
            div.field {
                label for="file" { "PDF File" }
                input id="file" type="file" name="file" accept=".pdf,application/pdf" required;
                (field_errors(errors, "file"))
            }
            button type="submit" { "Upload Book" }
        }
    }
}

pub fn not_found() -> Markup {
    layout(
        "Page not found",
        None,
        html! {
            h1 { "Page not found" }
            p { "The page you were looking for does not exist. " a href="/" { "Return home." } }
        },
    )
}

pub fn payload_too_large() -> Markup {
    layout(
        "Upload too large",
        None,
        html! {
            h1 { "Upload too large" }
            p {
                "The request was larger than this site accepts. "
                a href="/upload-book" { "Try again." }
            }
        },
    )
}

pub fn bad_request(detail: &str) -> Markup {
    layout(
        "Bad request",
        None,
        html! {
            h1 { "Bad request" }
            p { (detail) }
        },
    )
}

pub fn internal_error() -> Markup {
    layout(
        "Server error",
        None,
        html! {
            h1 { "Something went wrong" }
            p { "An unexpected error occurred. Please try again later." }
        },
    )
}
