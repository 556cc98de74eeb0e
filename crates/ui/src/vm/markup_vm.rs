use std::collections::HashSet;

use quiz_core::model::Markup;

/// Strip everything but inline formatting from author-supplied markup.
#[must_use]
pub fn sanitize_markup(markup: &Markup) -> String {
    let tags: HashSet<&str> = [
        "p", "div", "span", "br", "em", "strong", "b", "i", "u", "sub", "sup", "code", "pre",
        "ul", "ol", "li",
    ]
    .into_iter()
    .collect();

    ammonia::Builder::new()
        .tags(tags)
        .clean(markup.as_str())
        .to_string()
}

/// Terminal rendering of question markup.
#[must_use]
pub fn markup_to_text(markup: &Markup) -> String {
    let text = html2md::parse_html(&sanitize_markup(markup));
    text.trim().to_owned()
}
