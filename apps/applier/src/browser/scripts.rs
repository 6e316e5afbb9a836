// Scripts injected through WebDriver `execute/sync`.
//
// Every script that touches the application form starts from FORM_ROOT, the
// active dialog container (or <body> when no dialog is open). Scanned
// controls are tagged with a `data-applier-handle` attribute; later calls
// address them by that handle.

pub const HANDLE_ATTR: &str = "data-applier-handle";

const FORM_ROOT: &str = r#"
const root = document.querySelector(
  "div[role='dialog'], div[class*='jobs-easy-apply'], div[class*='artdeco-modal'], div[aria-modal='true']"
) || document.body;
const visible = (el) => !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
const text = (el) => (el.innerText || el.textContent || "").trim();
"#;

const SCAN_FIELDS_BODY: &str = r#"
let next = 0;
const tag = (el) => {
  let h = el.getAttribute("data-applier-handle");
  if (!h) { h = "applier-" + Date.now() + "-" + (next++); el.setAttribute("data-applier-handle", h); }
  return h;
};
const labelFor = (el) => {
  const aria = el.getAttribute("aria-label");
  if (aria && aria.trim()) return aria.trim();
  if (el.id) {
    const l = root.querySelector("label[for='" + CSS.escape(el.id) + "']");
    if (l && text(l)) return text(l);
  }
  const wrap = el.closest("label");
  if (wrap && text(wrap)) return text(wrap);
  const labelledBy = el.getAttribute("aria-labelledby");
  if (labelledBy) {
    const l = document.getElementById(labelledBy.split(" ")[0]);
    if (l && text(l)) return text(l);
  }
  return (el.getAttribute("placeholder") || el.getAttribute("name") || "").trim();
};
const required = (el) => el.required || el.getAttribute("aria-required") === "true";
const out = [];

root.querySelectorAll("fieldset").forEach((group) => {
  if (!visible(group)) return;
  const options = Array.from(group.querySelectorAll("label")).map(text).filter((t) => t);
  if (!options.length) return;
  out.push({
    handle: tag(group), label: text(group).split("\n")[0], kind: "radio_group",
    input_type: "", current_value: "", required: !!group.querySelector("[required],[aria-required='true']"),
    options, checked: false,
  });
});

root.querySelectorAll("input").forEach((el) => {
  if (!visible(el) && el.type !== "file") return;
  const type = (el.type || "text").toLowerCase();
  if (["text", "email", "tel", "number"].includes(type)) {
    out.push({ handle: tag(el), label: labelFor(el), kind: "text", input_type: type,
      current_value: el.value || "", required: required(el), options: [], checked: false });
  } else if (type === "file") {
    out.push({ handle: tag(el), label: labelFor(el), kind: "file_upload", input_type: type,
      current_value: "", required: required(el), options: [], checked: false });
  } else if (type === "checkbox") {
    out.push({ handle: tag(el), label: labelFor(el), kind: "checkbox", input_type: type,
      current_value: "", required: required(el), options: [], checked: el.checked });
  }
});

root.querySelectorAll("textarea").forEach((el) => {
  if (!visible(el)) return;
  out.push({ handle: tag(el), label: labelFor(el), kind: "textarea", input_type: "",
    current_value: el.value || text(el), required: required(el), options: [], checked: false });
});

root.querySelectorAll("select").forEach((el) => {
  const selected = el.selectedIndex >= 0 ? el.options[el.selectedIndex] : null;
  const value = selected && el.value ? text(selected) : "";
  out.push({ handle: tag(el), label: labelFor(el), kind: "dropdown", input_type: "",
    current_value: value, required: required(el),
    options: Array.from(el.options).map(text), checked: false });
});

root.querySelectorAll("div[role='button'][aria-haspopup='listbox']").forEach((el) => {
  if (!visible(el)) return;
  out.push({ handle: tag(el), label: labelFor(el), kind: "custom_dropdown", input_type: "",
    current_value: text(el), required: required(el), options: [], checked: false });
});

return out;
"#;

const SELECT_OPTION_BODY: &str = r#"
const [handle, index] = [arguments[0], arguments[1]];
const el = document.querySelector("[data-applier-handle='" + handle + "']");
if (!el) return false;
el.scrollIntoView({ block: "center" });
if (el.tagName === "SELECT") {
  el.selectedIndex = index;
  el.dispatchEvent(new Event("input", { bubbles: true }));
  el.dispatchEvent(new Event("change", { bubbles: true }));
  return true;
}
if (el.tagName === "FIELDSET") {
  const option = el.querySelectorAll("label")[index];
  if (!option) return false;
  option.click();
  return true;
}
const options = document.querySelectorAll("div[role='option'], li[role='option']");
if (!options.length) el.click();
const option = document.querySelectorAll("div[role='option'], li[role='option']")[index];
if (!option) return false;
option.scrollIntoView({ block: "center" });
option.click();
return true;
"#;

const LOAD_OPTIONS_BODY: &str = r#"
const el = document.querySelector("[data-applier-handle='" + arguments[0] + "']");
if (!el) return null;
el.scrollIntoView({ block: "center" });
if (el.tagName === "SELECT") {
  return Array.from(el.options).map(text);
}
el.click();
return null;
"#;

const RENDERED_OPTIONS_BODY: &str = r#"
return Array.from(document.querySelectorAll("div[role='option'], li[role='option']"))
  .map(text).filter((t) => t);
"#;

const VALIDATION_ERRORS_BODY: &str = r#"
const found = new Set();
const selectors = "[class*='error'], [class*='invalid'], [role='alert'], .artdeco-inline-feedback--error";
root.querySelectorAll(selectors).forEach((el) => {
  const t = text(el);
  if (t && t.length < 200 && visible(el)) found.add(t);
});
const phrases = ["Please enter a valid", "Enter a decimal number", "Please make a selection", "required"];
root.querySelectorAll("span, div, p").forEach((el) => {
  if (el.children.length) return;
  const t = text(el);
  if (t && t.length < 200 && visible(el) && phrases.some((p) => t.includes(p))) found.add(t);
});
return Array.from(found);
"#;

const CLICK_CONTROL_BODY: &str = r#"
const wanted = arguments[0];
const buttons = Array.from(document.querySelectorAll("button")).filter((b) => visible(b) && !b.disabled);
const scoped = buttons.filter((b) => root.contains(b));
const pool = scoped.length ? scoped : buttons;
let target = null;
if (wanted === null) {
  target = pool.find((b) => (b.className || "").includes("artdeco-button--primary"));
} else {
  target = pool.find((b) => (b.getAttribute("aria-label") || "").includes(wanted))
    || pool.find((b) => text(b).includes(wanted));
}
if (!target) return false;
target.scrollIntoView({ block: "center" });
target.click();
return true;
"#;

const APPLICATION_COMPLETE_BODY: &str = r#"
if (document.querySelector("div[class*='jobs-apply-confirmation'], div[class*='artdeco-inline-feedback'][class*='success']")) {
  return true;
}
const body = document.body.innerText || "";
return ["Application sent", "Your application was sent", "Application submitted", "Thank you", "We have received"]
  .some((p) => body.includes(p));
"#;

const PENDING_FIELDS_BODY: &str = r#"
if (root === document.body) return false;
return Array.from(root.querySelectorAll("input[type='text'], input[type='email'], textarea"))
  .some((el) => visible(el) && !(el.value || "").trim());
"#;

const EXIT_PROMPT_VISIBLE_BODY: &str = r#"
return Array.from(document.querySelectorAll("div[class*='artdeco-modal']")).some((m) => {
  const t = text(m).toLowerCase();
  return visible(m) && (t.includes("save application") || t.includes("haven't finished") || t.includes("haven’t finished"));
});
"#;

const RESOLVE_EXIT_PROMPT_BODY: &str = r#"
const choice = arguments[0];
const modal = Array.from(document.querySelectorAll("div[class*='artdeco-modal']")).find(visible);
if (!modal) return false;
const option = Array.from(modal.querySelectorAll("label, button")).find((el) => text(el).toLowerCase().includes(choice));
if (option) option.click();
const confirm = Array.from(modal.querySelectorAll("button"))
  .find((b) => /submit|save|discard/i.test(text(b)) && b !== option);
if (confirm) confirm.click();
return !!(option || confirm);
"#;

// ── Job board ──────────────────────────────────────────────────────────────

const JOB_CARDS: &str = r#"
const cards = () => Array.from(document.querySelectorAll(
  "li[data-occludable-job-id], li.jobs-search-results__list-item, div.job-card-container"
)).filter((c, i, all) => !all.some((o) => o !== c && o.contains(c)));
"#;

const POSTING_COUNT_BODY: &str = "return cards().length;";

const OPEN_POSTING_BODY: &str = r#"
const card = cards()[arguments[0]];
if (!card) return null;
card.scrollIntoView({ block: "center" });
const link = card.querySelector("a.job-card-list__title, a.job-card-container__link, a") || card;
link.click();
const title = card.querySelector(".job-card-list__title, .job-card-container__link, strong");
return title ? (title.innerText || "").trim().split("\n")[0] : null;
"#;

const DETAIL_TITLE_BODY: &str = r#"
const el = document.querySelector(
  ".job-details-jobs-unified-top-card__job-title, .jobs-unified-top-card__job-title, .jobs-details h1, h1"
);
return el ? (el.innerText || "").trim() : null;
"#;

const OPEN_EASY_APPLY_BODY: &str = r#"
const button = Array.from(document.querySelectorAll("button.jobs-apply-button, button[aria-label*='Easy Apply']"))
  .find((b) => !b.disabled && (b.innerText || b.getAttribute("aria-label") || "").includes("Easy Apply"));
if (!button) return false;
button.scrollIntoView({ block: "center" });
button.click();
return true;
"#;

const SCROLL_RESULTS_BODY: &str = r#"
const list = document.querySelector(".jobs-search-results-list, .scaffold-layout__list, .jobs-search-results");
const all = cards();
if (all.length) all[all.length - 1].scrollIntoView({ block: "end" });
if (list) list.scrollTop = list.scrollHeight;
return all.length;
"#;

const DISMISS_OVERLAYS_BODY: &str = r#"
let closed = 0;
document.querySelectorAll("button[aria-label='Dismiss'], button.artdeco-modal__dismiss, button[aria-label*='Close']")
  .forEach((b) => { if (visible(b)) { b.click(); closed++; } });
return closed;
"#;

fn with_root(body: &str) -> String {
    format!("{FORM_ROOT}{body}")
}

fn with_cards(body: &str) -> String {
    format!("{FORM_ROOT}{JOB_CARDS}{body}")
}

pub fn scan_fields() -> String {
    with_root(SCAN_FIELDS_BODY)
}

pub fn select_option() -> String {
    with_root(SELECT_OPTION_BODY)
}

pub fn load_options() -> String {
    with_root(LOAD_OPTIONS_BODY)
}

pub fn rendered_options() -> String {
    with_root(RENDERED_OPTIONS_BODY)
}

pub fn validation_errors() -> String {
    with_root(VALIDATION_ERRORS_BODY)
}

pub fn click_control() -> String {
    with_root(CLICK_CONTROL_BODY)
}

pub fn application_complete() -> String {
    with_root(APPLICATION_COMPLETE_BODY)
}

pub fn pending_fields() -> String {
    with_root(PENDING_FIELDS_BODY)
}

pub fn exit_prompt_visible() -> String {
    with_root(EXIT_PROMPT_VISIBLE_BODY)
}

pub fn resolve_exit_prompt() -> String {
    with_root(RESOLVE_EXIT_PROMPT_BODY)
}

pub fn dispatch_change() -> String {
    format!(
        "const el = document.querySelector(\"[{HANDLE_ATTR}='\" + arguments[0] + \"']\");\n\
         if (!el) return false;\n\
         el.dispatchEvent(new Event('input', {{ bubbles: true }}));\n\
         el.dispatchEvent(new Event('change', {{ bubbles: true }}));\n\
         return true;"
    )
}

pub fn posting_count() -> String {
    with_cards(POSTING_COUNT_BODY)
}

pub fn open_posting() -> String {
    with_cards(OPEN_POSTING_BODY)
}

pub fn detail_title() -> String {
    with_root(DETAIL_TITLE_BODY)
}

pub fn open_easy_apply() -> String {
    with_root(OPEN_EASY_APPLY_BODY)
}

pub fn scroll_results() -> String {
    with_cards(SCROLL_RESULTS_BODY)
}

pub fn dismiss_overlays() -> String {
    with_root(DISMISS_OVERLAYS_BODY)
}

/// CSS selector for a tagged control.
pub fn handle_selector(handle: &str) -> String {
    format!("[{HANDLE_ATTR}='{}']", handle.replace('\'', "\\'"))
}
