//! Fixture reader: recursive descent from tokens to the canonical tree.
//!
//! ```text
//! fixture text ──Lexer──▶ tokens ──Reader──▶ CanonicalNode("root")
//!                                              ├── Lexicon
//!                                              │     └── LexEntry ...
//!                                              └── notes
//!                                                    └── annotation ...
//! ```
//!
//! All parse state lives in one `Reader` value owned by a single
//! `parse_fixture` call.

use crate::error::OracleError;
use crate::lexer::{Lexer, Token, TokenKind, malformed};
use crate::node::{CanonicalNode, LABEL_PREFIX, attrs, names};
use regex::Regex;
use std::sync::OnceLock;

pub const NOT_AN_ARRAY: &str = "JSON data doesn't have an array as outermost element";
pub const UNCLOSED_ARRAY: &str = "JSON data didn't end with an end-of-array token";

/// Parse fixture text into a canonical tree rooted at `root`.
pub fn parse_fixture(text: &str) -> Result<CanonicalNode, OracleError> {
    let tokens = Lexer::tokenize(text)?;
    Reader::new(tokens).read_fixture()
}

/// Every property name the fixture language knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropertyKind {
    Lexicon,
    Notes,
    Lexeme,
    Senses,
    Definition,
    Gloss,
    PartOfSpeech,
    Class,
    Ref,
    Message,
    Messages,
    Replies,
    Status,
    Value,
}

impl PropertyKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "lexicon" => Some(Self::Lexicon),
            "notes" => Some(Self::Notes),
            "lexeme" => Some(Self::Lexeme),
            "senses" => Some(Self::Senses),
            "definition" => Some(Self::Definition),
            "gloss" => Some(Self::Gloss),
            "partOfSpeech" => Some(Self::PartOfSpeech),
            "class" => Some(Self::Class),
            "ref" => Some(Self::Ref),
            "message" => Some(Self::Message),
            "messages" => Some(Self::Messages),
            "replies" => Some(Self::Replies),
            "status" => Some(Self::Status),
            "value" => Some(Self::Value),
            _ => None,
        }
    }
}

/// A property key together with where it was written.
struct Key {
    name: String,
    kind: PropertyKind,
    line: u32,
    column: u32,
}

impl Key {
    fn not_allowed(&self, context: &str) -> OracleError {
        malformed(
            format!("property '{}' is not allowed in {context}", self.name),
            self.line,
            self.column,
        )
    }
}

fn absence_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^no\s+(\S+)").expect("absence comment regex must compile"))
}

fn upper_first(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A `message` as written in the fixture.
struct MessageSpec {
    status: Option<String>,
    value: Option<String>,
}

impl MessageSpec {
    fn into_node(self) -> CanonicalNode {
        let node = CanonicalNode::leaf(names::MESSAGE, self.value.unwrap_or_default());
        match self.status {
            Some(status) => node.with_attribute(attrs::STATUS, status),
            None => node,
        }
    }
}

struct Reader {
    tokens: Vec<Token>,
    pos: usize,
    comments: Vec<String>,
}

impl Reader {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            comments: Vec::new(),
        }
    }

    // ── Token plumbing ──

    /// Next significant token; comments on the way are buffered.
    fn peek(&mut self) -> &Token {
        while let Some(Token {
            kind: TokenKind::Comment(body),
            ..
        }) = self.tokens.get(self.pos)
        {
            self.comments.push(body.clone());
            self.pos += 1;
        }
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn unexpected(token: &Token, expected: &str) -> OracleError {
        if token.kind == TokenKind::Eof {
            return malformed(UNCLOSED_ARRAY, token.line, token.column);
        }
        malformed(
            format!("expected {expected}, found {}", token.kind.describe()),
            token.line,
            token.column,
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, OracleError> {
        let token = self.next();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(Self::unexpected(&token, expected))
        }
    }

    fn expect_string(&mut self, context: &str) -> Result<String, OracleError> {
        let token = self.next();
        match token.kind {
            TokenKind::String(value) => Ok(value),
            _ => Err(Self::unexpected(&token, &format!("a string for {context}"))),
        }
    }

    fn discard_comments(&mut self) {
        self.comments.clear();
    }

    /// Turn buffered `no <field>` comments into absence markers.
    fn take_absence_markers(&mut self) -> Vec<CanonicalNode> {
        self.comments
            .drain(..)
            .filter_map(|body| {
                absence_comment_re()
                    .captures(&body)
                    .map(|caps| CanonicalNode::absent(upper_first(&caps[1])))
            })
            .collect()
    }

    /// Read properties of the fixture language up to the closing brace.
    fn read_object<F>(&mut self, mut property: F) -> Result<(), OracleError>
    where
        F: FnMut(&mut Self, Key) -> Result<(), OracleError>,
    {
        self.read_members(|reader, name, line, column| {
            let kind = PropertyKind::from_name(&name).ok_or_else(|| {
                malformed(format!("unknown property '{name}'"), line, column)
            })?;
            property(
                reader,
                Key {
                    name,
                    kind,
                    line,
                    column,
                },
            )
        })
    }

    /// Read `name : <value>` pairs up to the closing brace. The opening
    /// brace has already been consumed.
    fn read_members<F>(&mut self, mut member: F) -> Result<(), OracleError>
    where
        F: FnMut(&mut Self, String, u32, u32) -> Result<(), OracleError>,
    {
        loop {
            let token = self.next();
            let (name, line, column) = match token.kind {
                TokenKind::RightBrace => return Ok(()),
                TokenKind::String(name) | TokenKind::Identifier(name) => {
                    (name, token.line, token.column)
                }
                _ => return Err(Self::unexpected(&token, "a property name or '}'")),
            };
            self.expect(TokenKind::Colon, "':'")?;
            member(self, name, line, column)?;

            let token = self.next();
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::RightBrace => return Ok(()),
                _ => return Err(Self::unexpected(&token, "',' or '}'")),
            }
        }
    }

    /// Read list items up to the closing bracket. The opening bracket has
    /// already been consumed.
    fn read_list<F>(&mut self, mut item: F) -> Result<(), OracleError>
    where
        F: FnMut(&mut Self) -> Result<(), OracleError>,
    {
        loop {
            if self.peek().kind == TokenKind::RightBracket {
                self.next();
                return Ok(());
            }
            item(self)?;

            let token = self.next();
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::RightBracket => return Ok(()),
                _ => return Err(Self::unexpected(&token, "',' or ']'")),
            }
        }
    }

    /// Consume and drop one value of any shape.
    fn skip_value(&mut self) -> Result<(), OracleError> {
        let token = self.next();
        match token.kind {
            TokenKind::LeftBrace => self.read_members(|reader, _, _, _| reader.skip_value()),
            TokenKind::LeftBracket => self.read_list(Self::skip_value),
            TokenKind::String(_)
            | TokenKind::Number(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => Ok(()),
            _ => Err(Self::unexpected(&token, "a value")),
        }
    }

    // ── Grammar ──

    fn read_fixture(mut self) -> Result<CanonicalNode, OracleError> {
        let first = self.next();
        if first.kind != TokenKind::LeftBracket {
            return Err(malformed(NOT_AN_ARRAY, first.line, first.column));
        }

        let mut sections = Vec::new();
        self.read_list(|reader| {
            let token = reader.next();
            if token.kind != TokenKind::LeftBrace {
                return Err(Self::unexpected(&token, "a section object"));
            }
            reader.read_object(|reader, key| {
                reader.discard_comments();
                match key.kind {
                    PropertyKind::Lexicon => sections.push(reader.read_lexicon()?),
                    PropertyKind::Notes => sections.push(reader.read_notes()?),
                    _ => return Err(key.not_allowed("a section")),
                }
                Ok(())
            })?;
            reader.discard_comments();
            Ok(())
        })?;

        let trailing = self.peek().clone();
        if trailing.kind != TokenKind::Eof {
            return Err(malformed(
                "unexpected content after the outermost array",
                trailing.line,
                trailing.column,
            ));
        }

        Ok(CanonicalNode::new(names::ROOT).with_children(sections))
    }

    fn read_lexicon(&mut self) -> Result<CanonicalNode, OracleError> {
        self.expect(TokenKind::LeftBracket, "'[' to open the lexicon")?;
        let mut entries = Vec::new();
        self.read_list(|reader| {
            reader.discard_comments();
            entries.push(reader.read_entry()?);
            Ok(())
        })?;
        self.discard_comments();
        Ok(CanonicalNode::new(names::LEXICON).with_children(entries))
    }

    fn read_entry(&mut self) -> Result<CanonicalNode, OracleError> {
        let open = self.expect(TokenKind::LeftBrace, "a lex entry object")?;
        let mut children = Vec::new();
        let mut has_lexeme = false;
        self.read_object(|reader, key| {
            children.extend(reader.take_absence_markers());
            match key.kind {
                PropertyKind::Lexeme => {
                    let (ws, value) = reader.read_ws_value()?;
                    children.push(lexeme_form(ws, value));
                    has_lexeme = true;
                }
                PropertyKind::Senses => children.push(reader.read_senses()?),
                _ => return Err(key.not_allowed("a lex entry")),
            }
            Ok(())
        })?;
        children.extend(self.take_absence_markers());

        if !has_lexeme {
            return Err(malformed(
                "lex entry has no 'lexeme'",
                open.line,
                open.column,
            ));
        }
        Ok(CanonicalNode::new(names::LEX_ENTRY).with_children(children))
    }

    fn read_senses(&mut self) -> Result<CanonicalNode, OracleError> {
        let open = self.expect(TokenKind::LeftBracket, "'[' to open the senses")?;
        let mut senses = Vec::new();
        self.read_list(|reader| {
            senses.push(reader.read_sense()?);
            Ok(())
        })?;

        // Markers written after the last sense belong to it.
        let trailing = self.take_absence_markers();
        if !trailing.is_empty() {
            let Some(last) = senses.pop() else {
                return Err(malformed(
                    "absence comment outside a sense",
                    open.line,
                    open.column,
                ));
            };
            senses.push(last.with_children(trailing));
        }
        Ok(CanonicalNode::new(names::SENSES).with_children(senses))
    }

    fn read_sense(&mut self) -> Result<CanonicalNode, OracleError> {
        self.expect(TokenKind::LeftBrace, "a sense object")?;
        let mut children = Vec::new();
        self.read_object(|reader, key| {
            children.extend(reader.take_absence_markers());
            match key.kind {
                PropertyKind::Definition => {
                    let (ws, value) = reader.read_ws_value()?;
                    children.push(definition(ws, value));
                }
                PropertyKind::Gloss => {
                    let (ws, value) = reader.read_ws_value()?;
                    children.push(gloss(ws, value));
                }
                // Parts of speech are not verified on either side.
                PropertyKind::PartOfSpeech => reader.skip_value()?,
                _ => return Err(key.not_allowed("a sense")),
            }
            Ok(())
        })?;
        children.extend(self.take_absence_markers());
        Ok(CanonicalNode::new(names::OWNSEQ).with_children(children))
    }

    /// `{ <ws> : { "value" : <string> } }`
    fn read_ws_value(&mut self) -> Result<(String, String), OracleError> {
        self.expect(TokenKind::LeftBrace, "a writing-system object")?;
        let token = self.next();
        let ws = match token.kind {
            TokenKind::String(ws) | TokenKind::Identifier(ws) => ws,
            _ => return Err(Self::unexpected(&token, "a writing-system code")),
        };
        self.expect(TokenKind::Colon, "':'")?;
        self.expect(TokenKind::LeftBrace, "'{' to open the writing-system value")?;

        let token = self.next();
        match &token.kind {
            TokenKind::String(name) | TokenKind::Identifier(name) if name == "value" => {}
            _ => return Err(Self::unexpected(&token, "property 'value'")),
        }
        self.expect(TokenKind::Colon, "':'")?;
        let value = self.expect_string("'value'")?;
        self.expect(TokenKind::RightBrace, "'}' after the value")?;
        self.expect(
            TokenKind::RightBrace,
            "'}' (exactly one writing system per value)",
        )?;
        Ok((ws, value))
    }

    fn read_notes(&mut self) -> Result<CanonicalNode, OracleError> {
        self.expect(TokenKind::LeftBracket, "'[' to open the notes")?;
        let mut annotations = Vec::new();
        self.read_list(|reader| {
            reader.discard_comments();
            annotations.push(reader.read_note()?);
            Ok(())
        })?;
        self.discard_comments();
        Ok(CanonicalNode::new(names::NOTES).with_children(annotations))
    }

    fn read_note(&mut self) -> Result<CanonicalNode, OracleError> {
        self.expect(TokenKind::LeftBrace, "a note object")?;
        let mut note = CanonicalNode::new(names::ANNOTATION);
        let mut head = Vec::new();
        let mut replies = Vec::new();
        let mut markers = Vec::new();
        self.read_object(|reader, key| {
            markers.extend(reader.take_absence_markers());
            match key.kind {
                PropertyKind::Class => {
                    let class = reader.expect_string("'class'")?;
                    note = std::mem::take(&mut note).with_attribute(attrs::CLASS, class);
                }
                PropertyKind::Ref => {
                    let target = reader.expect_string("'ref'")?;
                    note = std::mem::take(&mut note)
                        .with_attribute(attrs::REF, format!("{LABEL_PREFIX}{target}"));
                }
                PropertyKind::Message => head.push(reader.read_message()?),
                PropertyKind::Messages => {
                    reader.expect(TokenKind::LeftBracket, "'[' to open the messages")?;
                    reader.read_list(|reader| {
                        head.push(reader.read_reply()?);
                        Ok(())
                    })?;
                }
                PropertyKind::Replies => {
                    reader.expect(TokenKind::LeftBracket, "'[' to open the replies")?;
                    reader.read_list(|reader| {
                        replies.push(reader.read_reply()?);
                        Ok(())
                    })?;
                }
                _ => return Err(key.not_allowed("a note")),
            }
            Ok(())
        })?;
        markers.extend(self.take_absence_markers());

        Ok(note
            .with_children(head.into_iter().map(MessageSpec::into_node))
            .with_children(replies.into_iter().map(MessageSpec::into_node))
            .with_children(markers))
    }

    /// `{ "status" : <string>, "value" : <string> }`
    fn read_message(&mut self) -> Result<MessageSpec, OracleError> {
        self.expect(TokenKind::LeftBrace, "a message object")?;
        let mut message = MessageSpec {
            status: None,
            value: None,
        };
        self.read_object(|reader, key| reader.read_message_field(&mut message, key))?;
        self.discard_comments();
        Ok(message)
    }

    fn read_message_field(
        &mut self,
        message: &mut MessageSpec,
        key: Key,
    ) -> Result<(), OracleError> {
        match key.kind {
            PropertyKind::Status => message.status = Some(self.expect_string("'status'")?),
            PropertyKind::Value => message.value = Some(self.expect_string("'value'")?),
            _ => return Err(key.not_allowed("a message")),
        }
        Ok(())
    }

    /// A list item: either `{ "message" : <msg> }` or a bare `<msg>`.
    fn read_reply(&mut self) -> Result<MessageSpec, OracleError> {
        let open = self.expect(TokenKind::LeftBrace, "a reply object")?;
        let mut nested = None;
        let mut bare = MessageSpec {
            status: None,
            value: None,
        };
        let mut has_bare = false;
        self.read_object(|reader, key| match key.kind {
            PropertyKind::Message => {
                nested = Some(reader.read_message()?);
                Ok(())
            }
            _ => {
                has_bare = true;
                reader.read_message_field(&mut bare, key)
            }
        })?;
        self.discard_comments();

        match (nested, has_bare) {
            (Some(message), false) => Ok(message),
            (None, true) => Ok(bare),
            (Some(_), true) => Err(malformed(
                "reply mixes 'message' with bare message fields",
                open.line,
                open.column,
            )),
            (None, false) => Err(malformed("empty reply", open.line, open.column)),
        }
    }
}

fn lexeme_form(ws: String, value: String) -> CanonicalNode {
    let form = CanonicalNode::new(names::FORM)
        .with_child(CanonicalNode::leaf(names::AUNI, value).with_attribute(attrs::WS, ws));
    CanonicalNode::new(names::LEXEME_FORM)
        .with_child(CanonicalNode::new(names::MO_STEM_ALLOMORPH).with_child(form))
}

fn definition(ws: String, value: String) -> CanonicalNode {
    if value.is_empty() {
        return CanonicalNode::absent(names::DEFINITION);
    }
    let run = CanonicalNode::leaf(names::RUN, value).with_attribute(attrs::WS, ws.clone());
    CanonicalNode::new(names::DEFINITION).with_child(
        CanonicalNode::new(names::ASTR)
            .with_attribute(attrs::WS, ws)
            .with_child(run),
    )
}

fn gloss(ws: String, value: String) -> CanonicalNode {
    if value.is_empty() {
        return CanonicalNode::absent(names::GLOSS);
    }
    CanonicalNode::new(names::GLOSS)
        .with_child(CanonicalNode::leaf(names::AUNI, value).with_attribute(attrs::WS, ws))
}
