//! Extraction of the settings form and editorial links from host pages.
//!
//! Only the shapes the host actually serves are handled: the first form inside
//! the `main-container` element, and anchors there carrying `rel="noopener"`.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::ProfileForm;

static PROFILE_FORM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#main-container form").expect("static selector"));
static CONTROL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input, select, textarea").expect("static selector"));
static OPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("option").expect("static selector"));
static EDITORIAL_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#main-container a[rel~=noopener]").expect("static selector")
});

/// Parse the profile form's successful controls.
///
/// Buttons and disabled controls are skipped, checkboxes and radios only
/// contribute when checked, and a select contributes its selected option
/// (or its first option when none is marked).
pub(super) fn parse_profile_form(html: &str) -> Option<ProfileForm> {
    let document = Html::parse_document(html);
    let form = document.select(&PROFILE_FORM).next()?;
    let fields = form.select(&CONTROL).filter_map(control_value).collect();
    Some(ProfileForm::new(fields))
}

fn control_value(control: ElementRef<'_>) -> Option<(String, String)> {
    let element = control.value();
    let name = element.attr("name")?;
    if element.attr("disabled").is_some() {
        return None;
    }
    let value = match element.name() {
        "select" => selected_option(control)?,
        // The parser already drops the newline that directly follows `<textarea>`.
        "textarea" => control.text().collect(),
        _ => {
            let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
            match kind.as_str() {
                "submit" | "button" | "reset" | "image" | "file" => return None,
                "checkbox" | "radio" => {
                    element.attr("checked")?;
                    element.attr("value").unwrap_or("on").to_string()
                }
                _ => element.attr("value").unwrap_or_default().to_string(),
            }
        }
    };
    Some((name.to_string(), value))
}

fn selected_option(select: ElementRef<'_>) -> Option<String> {
    let mut first = None;
    for option in select.select(&OPTION) {
        let value = match option.value().attr("value") {
            Some(value) => value.to_string(),
            None => option.text().collect::<String>().trim().to_string(),
        };
        if option.value().attr("selected").is_some() {
            return Some(value);
        }
        first.get_or_insert(value);
    }
    first
}

/// `href`s of `rel="noopener"` anchors in the main container.
pub(super) fn editorial_hrefs(html: &str) -> Vec<String> {
    Html::parse_document(html)
        .select(&EDITORIAL_LINK)
        .filter_map(|anchor| anchor.value().attr("href").map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"
<html><body>
<form action="/logout" method="POST"><input type="hidden" name="csrf_token" value="nav"></form>
<div id="main-container" class="container">
  <form class="form-horizontal" action="/settings" method="POST">
    <input type="hidden" name="csrf_token" value="abc&#43;def=">
    <input type="text" class="form-control" name="ui.Affiliation" value="Tokyo &amp; Co">
    <select name="ui.Country"><option value="US">US</option><option value="JP" selected>JP</option></select>
    <select name="ui.BirthYear"><option value="">-</option><option value="1990">1990</option></select>
    <input type="checkbox" name="ui.Private" value="on">
    <input type="radio" name="ui.Lang" value="en">
    <input type="radio" name="ui.Lang" value="ja" checked>
    <textarea name="ui.Bio">
line one
line &lt;two&gt;</textarea>
    <input type="text" name="ui.Locked" value="x" disabled>
    <button type="submit" class="btn">Save</button>
    <input type="submit" name="commit" value="Save">
  </form>
</div>
</body></html>"#;

    #[test]
    fn settings_form_fields_are_extracted_in_order() {
        let form = parse_profile_form(SETTINGS).unwrap();
        let fields: Vec<(&str, &str)> = form
            .fields()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("csrf_token", "abc+def="),
                ("ui.Affiliation", "Tokyo & Co"),
                ("ui.Country", "JP"),
                ("ui.BirthYear", ""),
                ("ui.Lang", "ja"),
                ("ui.Bio", "line one\nline <two>"),
            ]
        );
    }

    #[test]
    fn page_without_form_yields_none() {
        assert!(parse_profile_form("<div id=\"main-container\">sign in</div>").is_none());
    }

    #[test]
    fn only_noopener_links_in_main_container_are_editorials() {
        let html = r#"
<a rel="noopener" href="/outside">nav</a>
<div id="main-container">
  <ul>
    <li><a href="/jump?url=https%3A%2F%2Fexample.com%2Fa&amp;x=1" rel="noopener" target="_blank">a</a></li>
    <li><a href="/users/someone">user</a></li>
    <li><a target="_blank" rel='noopener noreferrer' href="/contests/abc300/editorial/6000">b</a></li>
  </ul>
</div>"#;
        assert_eq!(
            editorial_hrefs(html),
            vec![
                "/jump?url=https%3A%2F%2Fexample.com%2Fa&x=1".to_string(),
                "/contests/abc300/editorial/6000".to_string(),
            ]
        );
    }

    #[test]
    fn quoted_markup_characters_survive_in_values() {
        let html = r#"
<div id="main-container"><form action="/settings" method="POST">
  <input type="hidden" name="csrf_token" value="t">
  <input type="text" name="ui.Affiliation" value="A>B &amp; &quot;Univ&quot; 'x'">
  <input type="text" name="ui.Motto" value='say "<hi>"'>
</form></div>"#;
        let form = parse_profile_form(html).unwrap();
        assert_eq!(form.get("ui.Affiliation"), Some(r#"A>B & "Univ" 'x'"#));
        assert_eq!(form.get("ui.Motto"), Some(r#"say "<hi>""#));
    }

    #[test]
    fn commented_out_markup_is_ignored() {
        let html = r#"
<div id="main-container">
  <!-- <form action="/old"><input name="stale" value="1"></form> -->
  <form action="/settings" method="POST">
    <input type="hidden" name="csrf_token" value="t">
    <!-- <input type="text" name="ui.Legacy" value="old"> -->
    <input type="text" name="ui.Affiliation" value="Kyoto">
  </form>
  <ul>
    <!-- <li><a rel="noopener" href="/hidden">x</a></li> -->
    <li><a rel="noopener" href="/shown">y</a></li>
  </ul>
</div>"#;
        let form = parse_profile_form(html).unwrap();
        let names: Vec<&str> = form.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["csrf_token", "ui.Affiliation"]);
        assert_eq!(editorial_hrefs(html), vec!["/shown".to_string()]);
    }
}
