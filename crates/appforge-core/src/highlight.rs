//! Syntax highlighting for the code editor panel
//!
//! Each supported language has a single-pass lexer that walks the source with
//! a cursor and emits non-overlapping tokens covering the whole input. The
//! markup produced by [`highlight`] wraps every non-text token in
//! `<span class="hl-<kind>">` with HTML-escaped contents, so stripping the
//! markup and unescaping always gives back the original source.

use crate::types::FileKind;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Languages with a dedicated lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Html,
    Css,
    JavaScript,
    TypeScript,
    Json,
}

impl Language {
    /// Resolve an editor language tag (`html`, `css`, `js`, `ts`, `json`, ...)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(Language::Html),
            "css" => Some(Language::Css),
            "js" | "javascript" | "jsx" | "mjs" => Some(Language::JavaScript),
            "ts" | "typescript" | "tsx" => Some(Language::TypeScript),
            "json" => Some(Language::Json),
            _ => None,
        }
    }

    /// Language used to display a file of the given kind
    pub fn for_kind(kind: FileKind) -> Option<Self> {
        match kind {
            FileKind::Html => Some(Language::Html),
            FileKind::Css => Some(Language::Css),
            FileKind::Js => Some(Language::JavaScript),
            FileKind::Ts => Some(Language::TypeScript),
            FileKind::Json => Some(Language::Json),
            FileKind::Markdown | FileKind::Image | FileKind::Binary | FileKind::Text => None,
        }
    }
}

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Unstyled text
    Text,
    Comment,
    String,
    Keyword,
    Number,
    /// HTML tag delimiters and names (`<div`, `>`, `</p>`)
    Tag,
    /// HTML attribute names
    Attribute,
    /// CSS selectors
    Selector,
    /// CSS property names
    Property,
    /// JSON object keys
    Key,
}

impl TokenKind {
    /// CSS class suffix used in the markup
    pub fn class_name(&self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::Comment => "comment",
            TokenKind::String => "string",
            TokenKind::Keyword => "keyword",
            TokenKind::Number => "number",
            TokenKind::Tag => "tag",
            TokenKind::Attribute => "attribute",
            TokenKind::Selector => "selector",
            TokenKind::Property => "property",
            TokenKind::Key => "key",
        }
    }
}

/// A classified slice of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "false", "finally", "for", "from",
    "function", "if", "import", "in", "instanceof", "let", "new", "null", "of", "return",
    "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var",
    "void", "while", "with", "yield",
];

const TS_KEYWORDS: &[&str] = &[
    "abstract", "any", "as", "boolean", "declare", "enum", "implements", "interface", "keyof",
    "namespace", "never", "number", "private", "protected", "public", "readonly", "string",
    "type", "unknown",
];

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Render `source` as highlighted HTML markup.
///
/// Unknown language tags produce the escaped source without any markup.
pub fn highlight(source: &str, language_tag: &str) -> String {
    match Language::from_tag(language_tag) {
        Some(language) => render(&tokenize(source, language)),
        None => escape_html(source),
    }
}

/// Split `source` into tokens for the given language
pub fn tokenize(source: &str, language: Language) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(source);
    match language {
        Language::Html => lexer.lex_html(),
        Language::Css => lexer.lex_css(),
        Language::JavaScript => lexer.lex_script(false),
        Language::TypeScript => lexer.lex_script(true),
        Language::Json => lexer.lex_json(),
    }
    lexer.tokens
}

/// Render tokens to markup
pub fn render(tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    for token in tokens {
        if token.kind == TokenKind::Text {
            push_escaped(&mut out, token.text);
        } else {
            out.push_str("<span class=\"hl-");
            out.push_str(token.kind.class_name());
            out.push_str("\">");
            push_escaped(&mut out, token.text);
            out.push_str("</span>");
        }
    }
    out
}

/// Escape `&`, `<` and `>` for safe rendering
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lexer
// ─────────────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    // ── Cursor helpers ──

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.src[start..end]
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    /// Advance past the next occurrence of `pat`, or to the end of input
    fn eat_through(&mut self, pat: &str) {
        match self.rest().find(pat) {
            Some(idx) => self.pos += idx + pat.len(),
            None => self.pos = self.src.len(),
        }
    }

    /// Consume a quoted literal starting at the opening quote.
    ///
    /// Backslash escapes are honoured. Unless `multiline`, a bare newline
    /// terminates the literal (the newline itself is not consumed).
    fn eat_quoted(&mut self, multiline: bool) {
        let Some(quote) = self.bump() else {
            return;
        };
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.bump();
                self.bump();
                continue;
            }
            if ch == '\n' && !multiline {
                return;
            }
            self.bump();
            if ch == quote {
                return;
            }
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        if start >= self.pos {
            return;
        }
        let src = self.src;
        let text = &src[start..self.pos];
        if kind == TokenKind::Text {
            if let Some(last) = self.tokens.last_mut() {
                if last.kind == TokenKind::Text {
                    // Adjacent text slices are contiguous in the source
                    let merged_start = start - last.text.len();
                    last.text = &src[merged_start..self.pos];
                    return;
                }
            }
        }
        self.tokens.push(Token { kind, text });
    }

    /// Consume a single character as text
    fn push_char(&mut self) {
        let start = self.pos;
        self.bump();
        self.push(TokenKind::Text, start);
    }

    fn push_whitespace(&mut self) -> bool {
        let start = self.pos;
        self.eat_while(char::is_whitespace);
        self.push(TokenKind::Text, start);
        self.pos > start
    }

    // ── JavaScript / TypeScript ──

    fn lex_script(&mut self, typescript: bool) {
        while !self.is_eof() {
            let start = self.pos;
            let rest = self.rest();

            if rest.starts_with("//") {
                self.eat_while(|c| c != '\n');
                self.push(TokenKind::Comment, start);
                continue;
            }
            if rest.starts_with("/*") {
                self.pos += 2;
                self.eat_through("*/");
                self.push(TokenKind::Comment, start);
                continue;
            }

            let Some(ch) = self.peek() else {
                break;
            };
            match ch {
                '"' | '\'' => {
                    self.eat_quoted(false);
                    self.push(TokenKind::String, start);
                }
                '`' => {
                    self.eat_quoted(true);
                    self.push(TokenKind::String, start);
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek_second().is_some_and(|n| n.is_ascii_digit())) =>
                {
                    self.eat_number();
                    self.push(TokenKind::Number, start);
                }
                c if is_script_ident_start(c) => {
                    self.eat_while(is_script_ident_char);
                    let word = self.slice(start, self.pos);
                    let is_keyword = JS_KEYWORDS.contains(&word)
                        || (typescript && TS_KEYWORDS.contains(&word));
                    let kind = if is_keyword {
                        TokenKind::Keyword
                    } else {
                        TokenKind::Text
                    };
                    self.push(kind, start);
                }
                _ => self.push_char(),
            }
        }
    }

    fn eat_number(&mut self) {
        let mut prev = '\0';
        while let Some(ch) = self.peek() {
            let exponent_sign = (ch == '+' || ch == '-') && (prev == 'e' || prev == 'E');
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || exponent_sign {
                self.bump();
                prev = ch;
            } else {
                break;
            }
        }
    }

    // ── JSON ──

    fn lex_json(&mut self) {
        while !self.is_eof() {
            if self.push_whitespace() {
                continue;
            }
            let start = self.pos;
            let Some(ch) = self.peek() else {
                break;
            };
            match ch {
                '"' => {
                    self.eat_quoted(false);
                    let after = self.rest().trim_start();
                    let kind = if after.starts_with(':') {
                        TokenKind::Key
                    } else {
                        TokenKind::String
                    };
                    self.push(kind, start);
                }
                c if c == '-' || c.is_ascii_digit() => {
                    self.bump();
                    self.eat_while(|c| {
                        c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')
                    });
                    self.push(TokenKind::Number, start);
                }
                c if c.is_ascii_alphabetic() => {
                    self.eat_while(|c| c.is_ascii_alphanumeric());
                    let word = self.slice(start, self.pos);
                    let kind = if matches!(word, "true" | "false" | "null") {
                        TokenKind::Keyword
                    } else {
                        TokenKind::Text
                    };
                    self.push(kind, start);
                }
                _ => self.push_char(),
            }
        }
    }

    // ── CSS ──

    fn lex_css(&mut self) {
        self.lex_css_until(None);
    }

    /// Lex CSS until end of input or, when given, the start of `stop`
    fn lex_css_until(&mut self, stop: Option<usize>) {
        let end = stop.unwrap_or(self.src.len());
        let mut depth = 0usize;
        let mut expect_property = false;

        while self.pos < end {
            if self.push_whitespace_until(end) {
                continue;
            }
            let start = self.pos;
            let rest = self.slice(self.pos, end);

            if rest.starts_with("/*") {
                self.pos += 2;
                self.eat_through_within("*/", end);
                self.push(TokenKind::Comment, start);
                continue;
            }

            let Some(ch) = rest.chars().next() else {
                break;
            };
            match ch {
                '"' | '\'' => {
                    self.eat_quoted(false);
                    self.pos = self.pos.min(end);
                    self.push(TokenKind::String, start);
                }
                '@' => {
                    self.bump();
                    self.eat_while(is_css_ident_char);
                    self.pos = self.pos.min(end);
                    self.push(TokenKind::Keyword, start);
                }
                '{' => {
                    self.push_char();
                    depth += 1;
                    expect_property = true;
                }
                '}' => {
                    self.push_char();
                    depth = depth.saturating_sub(1);
                    expect_property = depth > 0;
                }
                ';' => {
                    self.push_char();
                    expect_property = depth > 0;
                }
                _ if depth == 0 || (expect_property && self.css_rule_opens_block(end)) => {
                    self.eat_css_selector(end);
                }
                c if expect_property && is_css_ident_char(c) => {
                    self.eat_while(is_css_ident_char);
                    self.pos = self.pos.min(end);
                    self.push(TokenKind::Property, start);
                    expect_property = false;
                }
                _ if expect_property => self.push_char(),
                _ => self.lex_css_value_char(end),
            }
        }
    }

    fn push_whitespace_until(&mut self, end: usize) -> bool {
        let start = self.pos;
        while self.pos < end {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += c.len_utf8(),
                _ => break,
            }
        }
        self.push(TokenKind::Text, start);
        self.pos > start
    }

    fn eat_through_within(&mut self, pat: &str, end: usize) {
        match self.slice(self.pos, end).find(pat) {
            Some(idx) => self.pos += idx + pat.len(),
            None => self.pos = end,
        }
    }

    /// Whether the text ahead reaches `{` before `;` or `}` (a nested rule)
    fn css_rule_opens_block(&self, end: usize) -> bool {
        self.slice(self.pos, end)
            .find(|c: char| matches!(c, '{' | ';' | '}'))
            .is_some_and(|idx| self.src.as_bytes()[self.pos + idx] == b'{')
    }

    fn eat_css_selector(&mut self, end: usize) {
        let start = self.pos;
        let limit = self
            .slice(self.pos, end)
            .find(|c: char| matches!(c, '{' | ';' | '}' | '"' | '\''))
            .map(|idx| self.pos + idx)
            .unwrap_or(end);
        let limit = match self.slice(self.pos, limit).find("/*") {
            Some(idx) => self.pos + idx,
            None => limit,
        };
        let selector_end = start + self.slice(start, limit).trim_end().len();
        if selector_end == start {
            // Only reachable for characters the selector scan refuses
            self.push_char();
            return;
        }
        self.pos = selector_end;
        self.push(TokenKind::Selector, start);
    }

    fn lex_css_value_char(&mut self, end: usize) {
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return;
        };
        let next_is_digit = self.peek_second().is_some_and(|n| n.is_ascii_digit());
        if ch.is_ascii_digit() || ((ch == '.' || ch == '-') && next_is_digit) {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit() || c == '.');
            self.eat_while(|c| c.is_ascii_alphabetic() || c == '%');
            self.pos = self.pos.min(end);
            self.push(TokenKind::Number, start);
        } else if ch == '#' && self.peek_second().is_some_and(|n| n.is_ascii_hexdigit()) {
            self.bump();
            self.eat_while(|c| c.is_ascii_hexdigit());
            self.pos = self.pos.min(end);
            self.push(TokenKind::Number, start);
        } else if self.rest().starts_with("!important") {
            self.pos += "!important".len();
            self.pos = self.pos.min(end);
            self.push(TokenKind::Keyword, start);
        } else if is_css_ident_char(ch) {
            self.eat_while(is_css_ident_char);
            self.pos = self.pos.min(end);
            self.push(TokenKind::Text, start);
        } else {
            self.push_char();
        }
    }

    // ── HTML ──

    fn lex_html(&mut self) {
        while !self.is_eof() {
            let start = self.pos;
            let rest = self.rest();

            if rest.starts_with("<!--") {
                self.pos += 4;
                self.eat_through("-->");
                self.push(TokenKind::Comment, start);
                continue;
            }
            if rest.starts_with("<!") {
                self.eat_through(">");
                self.push(TokenKind::Tag, start);
                continue;
            }
            if rest.starts_with('<') {
                let opens_tag = rest[1..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '/');
                if opens_tag {
                    self.lex_html_tag();
                    continue;
                }
                self.push_char();
                continue;
            }

            self.eat_while(|c| c != '<');
            self.push(TokenKind::Text, start);
        }
    }

    fn lex_html_tag(&mut self) {
        let start = self.pos;
        self.bump(); // '<'
        let closing = self.peek() == Some('/');
        if closing {
            self.bump();
        }
        let name_start = self.pos;
        self.eat_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':');
        let name = self.slice(name_start, self.pos).to_ascii_lowercase();
        self.push(TokenKind::Tag, start);

        let mut after_equals = false;
        while let Some(ch) = self.peek() {
            let attr_start = self.pos;
            if ch.is_whitespace() {
                self.push_whitespace();
                continue;
            }
            if ch == '>' || self.rest().starts_with("/>") {
                let self_closing = ch == '/';
                self.eat_through(">");
                self.push(TokenKind::Tag, attr_start);
                if !closing && !self_closing {
                    self.lex_embedded(&name);
                }
                return;
            }
            match ch {
                '=' => {
                    self.push_char();
                    after_equals = true;
                    continue;
                }
                '"' | '\'' => {
                    self.eat_quoted(true);
                    self.push(TokenKind::String, attr_start);
                }
                _ if after_equals => {
                    self.eat_while(|c| !c.is_whitespace() && c != '>');
                    self.push(TokenKind::String, attr_start);
                }
                _ if is_html_attr_char(ch) => {
                    self.eat_while(is_html_attr_char);
                    self.push(TokenKind::Attribute, attr_start);
                }
                _ => self.push_char(),
            }
            after_equals = false;
        }
    }

    /// Lex the body of `<script>` / `<style>` with the matching lexer
    fn lex_embedded(&mut self, tag_name: &str) {
        if tag_name != "script" && tag_name != "style" {
            return;
        }
        let closing = format!("</{}", tag_name);
        let body_end = find_ascii_case_insensitive(self.rest(), &closing)
            .map(|idx| self.pos + idx)
            .unwrap_or(self.src.len());

        if tag_name == "style" {
            self.lex_css_until(Some(body_end));
            return;
        }

        let mut inner = Lexer::new(self.slice(self.pos, body_end));
        inner.lex_script(false);
        let mut offset = self.pos;
        for token in inner.tokens {
            let token_start = offset;
            offset += token.text.len();
            self.pos = offset;
            self.push(token.kind, token_start);
        }
        self.pos = body_end;
    }
}

fn is_script_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_script_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_css_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn is_html_attr_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'' | '<')
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}
