//! Mock site generator
//!
//! Stands in for the AI model: turns a prompt into a small static site
//! (`index.html`, `styles.css`, `script.js`) plus an assistant message. The
//! output is deterministic for a given prompt and model.

use appforge_core::highlight::escape_html;
use appforge_core::FileRecord;

use crate::projects::project_name_from_prompt;

/// Entry page written by every generation
pub const INDEX_FILE: &str = "index.html";
const STYLES_FILE: &str = "styles.css";
const SCRIPT_FILE: &str = "script.js";

/// Accent colors picked by prompt hash
const ACCENTS: [&str; 6] = [
    "#6366f1", "#0ea5e9", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6",
];

/// The result of one mock generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSite {
    /// Assistant reply shown in the chat panel
    pub message: String,
    pub files: Vec<FileRecord>,
}

/// Kind of site inferred from the prompt wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiteKind {
    Portfolio,
    Shop,
    Blog,
    Todo,
    Landing,
}

impl SiteKind {
    fn detect(prompt: &str) -> Self {
        let prompt = prompt.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| prompt.contains(w));
        if has(&["portfolio", "resume", "cv"]) {
            SiteKind::Portfolio
        } else if has(&["shop", "store", "ecommerce", "e-commerce", "product"]) {
            SiteKind::Shop
        } else if has(&["blog", "article", "journal"]) {
            SiteKind::Blog
        } else if has(&["todo", "to-do", "task", "checklist"]) {
            SiteKind::Todo
        } else {
            SiteKind::Landing
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SiteKind::Portfolio => "portfolio",
            SiteKind::Shop => "storefront",
            SiteKind::Blog => "blog",
            SiteKind::Todo => "task list app",
            SiteKind::Landing => "landing page",
        }
    }

    fn sections(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            SiteKind::Portfolio => &[
                ("About", "A short introduction and what I care about."),
                ("Projects", "Selected work with links and screenshots."),
                ("Contact", "Say hello through the form below."),
            ],
            SiteKind::Shop => &[
                ("Featured", "This week's most popular products."),
                ("Catalog", "Browse everything in stock."),
                ("Checkout", "Secure checkout in three steps."),
            ],
            SiteKind::Blog => &[
                ("Latest posts", "Fresh writing, newest first."),
                ("Topics", "Find posts by theme."),
                ("Newsletter", "Get new posts by email."),
            ],
            SiteKind::Todo => &[
                ("Today", "Tasks due today."),
                ("Upcoming", "Everything planned for later."),
            ],
            SiteKind::Landing => &[
                ("Features", "Everything you need, nothing you don't."),
                ("Pricing", "Simple plans that grow with you."),
                ("Get started", "Sign up in under a minute."),
            ],
        }
    }
}

/// FNV-1a, stable across runs and platforms
fn stable_hash(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Build a site for `prompt`
pub fn generate_site(prompt: &str, model: &str) -> GeneratedSite {
    let title = project_name_from_prompt(prompt);
    let kind = SiteKind::detect(prompt);
    let accent = ACCENTS[(stable_hash(prompt) % ACCENTS.len() as u64) as usize];

    let files = vec![
        FileRecord::new(INDEX_FILE, render_index(&title, kind)),
        FileRecord::new(STYLES_FILE, render_styles(accent)),
        FileRecord::new(SCRIPT_FILE, render_script(kind)),
    ];

    let message = format!(
        "I've built a {} for \"{}\" using {}. It includes {}, {} and {}; open the preview to see it.",
        kind.label(),
        title,
        model,
        INDEX_FILE,
        STYLES_FILE,
        SCRIPT_FILE
    );

    GeneratedSite { message, files }
}

fn render_index(title: &str, kind: SiteKind) -> String {
    let title = escape_html(title);
    let mut sections = String::new();
    for (heading, body) in kind.sections() {
        let id = heading.to_lowercase().replace(' ', "-");
        sections.push_str(&format!(
            "    <section id=\"{}\" class=\"card\">\n      <h2>{}</h2>\n      <p>{}</p>\n    </section>\n",
            id, heading, body
        ));
    }

    let extra = if kind == SiteKind::Todo {
        "    <form id=\"task-form\">\n      <input id=\"task-input\" placeholder=\"Add a task\" />\n      <button type=\"submit\">Add</button>\n    </form>\n    <ul id=\"task-list\"></ul>\n"
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{title}</title>
  <link rel="stylesheet" href="{styles}" />
</head>
<body>
  <header class="hero">
    <h1>{title}</h1>
    <button id="cta" class="button">Get started</button>
  </header>
  <main>
{sections}{extra}  </main>
  <footer>Built with AppForge</footer>
  <script src="{script}"></script>
</body>
</html>
"#,
        title = title,
        styles = STYLES_FILE,
        sections = sections,
        extra = extra,
        script = SCRIPT_FILE,
    )
}

fn render_styles(accent: &str) -> String {
    format!(
        r#":root {{
  --accent: {accent};
  --text: #1f2937;
  --muted: #6b7280;
}}

* {{
  box-sizing: border-box;
}}

body {{
  margin: 0;
  font-family: system-ui, sans-serif;
  color: var(--text);
}}

.hero {{
  padding: 4rem 2rem;
  text-align: center;
  background: linear-gradient(135deg, var(--accent), #111827);
  color: white;
}}

.button {{
  padding: 0.75rem 1.5rem;
  border: none;
  border-radius: 999px;
  background: white;
  color: var(--accent);
  cursor: pointer;
}}

main {{
  display: grid;
  gap: 1.5rem;
  max-width: 960px;
  margin: 2rem auto;
  padding: 0 1rem;
}}

.card {{
  padding: 1.5rem;
  border-radius: 12px;
  box-shadow: 0 1px 3px rgba(0, 0, 0, 0.1);
}}

footer {{
  padding: 2rem;
  text-align: center;
  color: var(--muted);
}}

@media (min-width: 768px) {{
  main {{
    grid-template-columns: repeat(2, 1fr);
  }}
}}
"#,
        accent = accent
    )
}

fn render_script(kind: SiteKind) -> String {
    let mut script = String::from(
        r#"document.getElementById("cta").addEventListener("click", () => {
  const first = document.querySelector("section");
  if (first) {
    first.scrollIntoView({ behavior: "smooth" });
  }
});
"#,
    );

    if kind == SiteKind::Todo {
        script.push_str(
            r#"
const form = document.getElementById("task-form");
const list = document.getElementById("task-list");

form.addEventListener("submit", (event) => {
  event.preventDefault();
  const input = document.getElementById("task-input");
  const text = input.value.trim();
  if (text.length === 0) {
    return;
  }
  const item = document.createElement("li");
  item.textContent = text;
  item.addEventListener("click", () => item.classList.toggle("done"));
  list.appendChild(item);
  input.value = "";
});
"#,
        );
    }
    script
}
