//! Scheme markup parsing and serialization.
//!
//! A [`Scheme`] materializes markup into a live [`Document`] whose root holds a
//! single host element (`div` by default); the parsed top-level nodes, one per
//! application window, become the host's children. [`Scheme::html`] serializes
//! the host's content back so that load followed by serialize is lossless for
//! elements, attributes and text.

use tr_core::TrellisError;
use tr_core::TrellisResult;
use tr_dom::Document;
use tr_dom::NodeData;
use tr_dom::NodeId;

/// Options for creating a scheme handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeOptions {
    pub host_tag: String,
}

impl Default for SchemeOptions {
    fn default() -> Self {
        Self {
            host_tag: "div".to_owned(),
        }
    }
}

/// Owns one materialized scheme tree.
#[derive(Debug, Clone, Default)]
pub struct Scheme {
    options: SchemeOptions,
    document: Option<Document>,
}

impl Scheme {
    pub fn new(options: SchemeOptions) -> Self {
        Self {
            options,
            document: None,
        }
    }

    pub fn options(&self) -> &SchemeOptions {
        &self.options
    }

    /// Parses `markup` and replaces the current tree. On error the previous
    /// tree is kept.
    pub fn load_string(&mut self, markup: &str) -> TrellisResult<&Document> {
        let document = parse_scheme(markup, &self.options)?;
        tracing::debug!(
            nodes = document.node_count(),
            bytes = markup.len(),
            "scheme materialized"
        );
        Ok(self.document.insert(document))
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.document.as_mut()
    }

    /// Serializes the host element's content. Empty before the first load.
    pub fn html(&self) -> String {
        let Some(document) = &self.document else {
            return String::new();
        };

        match document.first_element_child(document.root()) {
            Some(host) => inner_html(document, host),
            None => String::new(),
        }
    }
}

/// Parses scheme markup into a document wrapped in the configured host tag.
pub fn parse_scheme(markup: &str, options: &SchemeOptions) -> TrellisResult<Document> {
    let tokens = tokenize(markup)?;
    let mut document = Document::new();
    let host = document.create_element(options.host_tag.clone(), Vec::new());
    let root = document.root();
    document.append_child(root, host)?;
    build_tree(&mut document, host, tokens)?;

    if document.first_element_child(host).is_none() {
        return Err(TrellisError::new(
            "markup.no_root",
            "scheme markup contains no elements",
        ));
    }

    Ok(document)
}

/// Serializes `node` and its subtree.
pub fn outer_html(document: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_subtree(document, node, &mut out);
    out
}

/// Serializes the children of `node`.
pub fn inner_html(document: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for child in document.children(node) {
        write_subtree(document, *child, &mut out);
    }
    out
}

enum Emit<'a> {
    Open(NodeId),
    Close(&'a str),
}

// Walks with an explicit stack so nesting depth is bounded by the heap only.
fn write_subtree(document: &Document, node: NodeId, out: &mut String) {
    let mut pending = vec![Emit::Open(node)];

    while let Some(emit) = pending.pop() {
        let id = match emit {
            Emit::Close(tag) => {
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
                continue;
            }
            Emit::Open(id) => id,
        };

        match document.node(id).map(|n| &n.data) {
            None => continue,
            Some(NodeData::Document) => {}
            Some(NodeData::Text(text)) => {
                escape_into(out, text, false);
                continue;
            }
            Some(NodeData::Element(element)) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(out, value, true);
                    out.push('"');
                }
                out.push('>');

                if is_void(&element.tag) {
                    continue;
                }
                pending.push(Emit::Close(&element.tag));
            }
        }

        pending.extend(document.children(id).iter().rev().map(|child| Emit::Open(*child)));
    }
}

fn escape_into(out: &mut String, input: &str, attribute: bool) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

fn tokenize(source: &str) -> TrellisResult<Vec<Token>> {
    let mut lexer = Lexer { src: source, pos: 0 };
    let mut tokens = Vec::new();

    while !lexer.at_end() {
        let start = lexer.pos;
        if lexer.eat("<!--") {
            lexer.skip_past("-->");
        } else if lexer.eat("</") {
            tokens.push(lexer.end_tag(start)?);
        } else if lexer.eat("<!") || lexer.eat("<?") {
            lexer.skip_past(">");
        } else if let Some(tag) = lexer.start_tag()? {
            tokens.push(tag);
        } else {
            tokens.push(Token::Text(lexer.text().to_owned()));
        }
    }

    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn eat(&mut self, prefix: &str) -> bool {
        let matched = self.rest().starts_with(prefix);
        if matched {
            self.pos += prefix.len();
        }
        matched
    }

    fn skip_past(&mut self, marker: &str) {
        self.pos = match self.rest().find(marker) {
            Some(at) => self.pos + at + marker.len(),
            None => self.src.len(),
        };
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !keep(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn name(&mut self) -> Option<String> {
        let name = self.take_while(is_name_char);
        (!name.is_empty()).then(|| name.to_ascii_lowercase())
    }

    /// Raw text up to the next `<`. A `<` that opens no tag stays in the text.
    fn text(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '<')
            .map_or(rest.len(), |(at, _)| at);
        self.pos += len;
        &rest[..len]
    }

    /// Called after `</`.
    fn end_tag(&mut self, start: usize) -> TrellisResult<Token> {
        self.skip_whitespace();
        let Some(name) = self.name() else {
            return Err(TrellisError::new(
                "markup.tag_invalid",
                format!("closing tag at byte {start} has no name"),
            ));
        };
        match self.rest().find('>') {
            Some(at) => self.pos += at + 1,
            None => return Err(unterminated(&name, start)),
        }
        Ok(Token::End { name })
    }

    /// `Ok(None)` when the input is not `<` followed by a tag name.
    fn start_tag(&mut self) -> TrellisResult<Option<Token>> {
        let start = self.pos;
        if !self.eat("<") {
            return Ok(None);
        }
        let Some(name) = self.name() else {
            self.pos = start;
            return Ok(None);
        };

        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            if self.eat(">") {
                break;
            }
            if self.eat("/") {
                self_closing = true;
                continue;
            }
            if self.at_end() {
                return Err(unterminated(&name, start));
            }

            let Some(attribute) = self.name() else {
                return Err(TrellisError::new(
                    "markup.attribute_invalid",
                    format!("unexpected character in `<{name}>` at byte {}", self.pos),
                ));
            };
            self.skip_whitespace();
            let value = if self.eat("=") {
                self.skip_whitespace();
                self.attribute_value(&name, start)?
            } else {
                ""
            };
            attrs.push((attribute, decode_entities(value)));
        }

        Ok(Some(Token::Start {
            name,
            attrs,
            self_closing,
        }))
    }

    fn attribute_value(&mut self, tag: &str, start: usize) -> TrellisResult<&'a str> {
        for quote in ["\"", "'"] {
            if self.eat(quote) {
                let rest = self.rest();
                let Some(len) = rest.find(quote) else {
                    return Err(unterminated(tag, start));
                };
                self.pos += len + 1;
                return Ok(&rest[..len]);
            }
        }
        Ok(self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/'))
    }
}

fn unterminated(name: &str, start: usize) -> TrellisError {
    TrellisError::new(
        "markup.unterminated_tag",
        format!("tag `{name}` opened at byte {start} is never closed with `>`"),
    )
}

fn build_tree(document: &mut Document, host: NodeId, tokens: Vec<Token>) -> TrellisResult<()> {
    let mut stack = vec![host];

    for token in tokens {
        let current = stack.last().copied().unwrap_or(host);
        match token {
            Token::Text(text) => {
                let node = document.create_text(decode_entities(&text));
                document.append_child(current, node)?;
            }
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                let void = self_closing || is_void(&name);
                let node = document.create_element(name, attrs);
                document.append_child(current, node)?;
                if !void {
                    stack.push(node);
                }
            }
            Token::End { name } => {
                let open = stack
                    .iter()
                    .skip(1)
                    .rposition(|node| document.tag_name(*node) == Some(name.as_str()));
                let Some(position) = open else {
                    if is_void(&name) {
                        continue;
                    }
                    return Err(TrellisError::new(
                        "markup.unexpected_end_tag",
                        format!("closing tag `</{name}>` has no matching open element"),
                    ));
                };
                // Unclosed elements nested inside the matched one close implicitly.
                stack.truncate(position + 1);
            }
        }
    }

    Ok(())
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..]
            .split_once(';')
            .and_then(|(entity, _)| Some((decode_entity(entity)?, entity.len() + 2)));
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    let ch = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            return char::from_u32(code);
        }
    };
    Some(ch)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}
