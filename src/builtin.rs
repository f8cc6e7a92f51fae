use maud::{Markup, PreEscaped, html};

use crate::theme::{StorageFormat, THEME_ATTRIBUTE};

/// `id` of the checkbox the browser snippet binds to.
pub const TOGGLE_ID: &str = "theme-switch";

const NAMED_STORAGE_JS: &str = r#"  function readTheme() {
    return localStorage.getItem(storageKey) === "dark" ? "dark" : "light";
  }

  function writeTheme(theme) {
    localStorage.setItem(storageKey, theme);
  }
"#;

const FLAG_STORAGE_JS: &str = r#"  function readTheme() {
    return localStorage.getItem(storageKey) ? "dark" : "light";
  }

  function writeTheme(theme) {
    if (theme === "dark") {
      localStorage.setItem(storageKey, "true");
    } else {
      localStorage.removeItem(storageKey);
    }
  }
"#;

const TOGGLE_JS: &str = r#"  function apply(theme) {
    root.setAttribute(attribute, theme === "dark" ? "dark" : "");
    if (toggle) toggle.checked = theme === "dark";
  }

  apply(readTheme());

  if (toggle) {
    toggle.addEventListener("change", function () {
      var next = root.getAttribute(attribute) === "dark" ? "light" : "dark";
      writeTheme(next);
      apply(next);
    });
  }
"#;

/// Browser version of `ThemeService`: same storage encoding, same attribute,
/// and the toggle inverts what the document shows rather than what is stored.
pub fn theme_toggle_script(format: &StorageFormat) -> String {
    let storage_js = match format {
        StorageFormat::Named { .. } => NAMED_STORAGE_JS,
        StorageFormat::Flag { .. } => FLAG_STORAGE_JS,
    };
    format!(
        "(function () {{\n  var storageKey = {key};\n  var attribute = {attr};\n  var root = document.documentElement;\n  var toggle = document.getElementById({id});\n\n{storage_js}\n{TOGGLE_JS}}})();",
        key = js_string(format.key()),
        attr = js_string(THEME_ATTRIBUTE),
        id = js_string(TOGGLE_ID),
    )
}

pub fn theme_toggle_control() -> Markup {
    html! {
        label class="theme-switch" for=(TOGGLE_ID) {
            input type="checkbox" id=(TOGGLE_ID) aria-label="Dark theme";
            span class="theme-switch-slider" {}
        }
    }
}

/// Control plus its inline script, ready to drop into a page.
pub fn theme_toggle(format: &StorageFormat) -> Markup {
    html! {
        (theme_toggle_control())
        script { (PreEscaped(theme_toggle_script(format))) }
    }
}

fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string().replace("</", "<\\/")
}
