//! Lenient CSS stylesheet parsing.
//!
//! Rules are split with `cssparser`; selector lists are compiled with
//! kuchiki so they can be matched against the parsed HTML. Anything that
//! cannot be inlined (at-rules, pseudo-elements, broken syntax) is skipped.

use std::fmt;

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser, Token,
};
use kuchiki::{ElementData, NodeDataRef, Selector, Selectors, Specificity};

/// A single `property: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name, lowercased unless it is a custom property.
    pub property: String,
    /// Value text without the `!important` flag.
    pub value: String,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

impl Declaration {
    /// Creates a declaration.
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        Ok(())
    }
}

/// A rule whose selectors compiled.
pub struct StyleRule {
    selectors: Selectors,
    declarations: Vec<Declaration>,
}

impl StyleRule {
    /// Highest specificity among this rule's selectors that match `element`.
    #[must_use]
    pub fn matching_specificity(&self, element: &NodeDataRef<ElementData>) -> Option<Specificity> {
        self.selectors
            .0
            .iter()
            .filter(|selector| selector.matches(element))
            .map(Selector::specificity)
            .max()
    }

    /// Declarations in source order.
    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }
}

/// Parsed stylesheet: the inlinable rules in source order.
#[derive(Default)]
pub struct Stylesheet {
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    /// Parses CSS text. Never fails; unusable rules are dropped.
    #[must_use]
    pub fn parse(css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rules = Vec::new();

        let mut rule_parser = TopLevelRuleParser { rules: &mut rules };
        for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
            if let Err((_, source)) = result {
                tracing::trace!(source, "Skipping CSS rule");
            }
        }

        Self { rules }
    }

    /// Rules in source order.
    #[must_use]
    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// Number of usable rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule can be applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Content of a `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleAttribute {
    /// Declarations that parsed, in source order.
    pub declarations: Vec<Declaration>,
    /// Source text of declarations that did not parse, such as `*zoom: 1`.
    pub unparsed: Vec<String>,
}

/// Parses a `style` attribute, keeping the text of rejected declarations.
#[must_use]
pub fn parse_style_attribute(block: &str) -> StyleAttribute {
    let mut input = ParserInput::new(block);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();
    let mut unparsed = Vec::new();

    let mut decl_parser = DeclarationListParser {
        declarations: &mut declarations,
    };
    for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
        if let Err((_, source)) = result {
            let source = source.trim().trim_end_matches(';').trim_end();
            if !source.is_empty() {
                unparsed.push(source.to_string());
            }
        }
    }

    StyleAttribute {
        declarations,
        unparsed,
    }
}

/// Parses a declaration list. Invalid declarations are dropped.
#[must_use]
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    parse_style_attribute(block).declarations
}

struct TopLevelRuleParser<'a> {
    rules: &'a mut Vec<StyleRule>,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        // @media, @import, @font-face ... have no inline equivalent
        tracing::trace!(name = %name, "Skipping at-rule");
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = String;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        Ok(input.slice_from(start).trim().to_string())
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut declarations = Vec::new();
        let mut decl_parser = DeclarationListParser {
            declarations: &mut declarations,
        };
        for result in RuleBodyParser::new(input, &mut decl_parser) {
            let _ = result;
        }

        if declarations.is_empty() {
            return Ok(());
        }

        match Selectors::compile(&prelude) {
            Ok(selectors) => self.rules.push(StyleRule {
                selectors,
                declarations,
            }),
            Err(()) => tracing::debug!(selector = %prelude, "Skipping rule with unsupported selector"),
        }

        Ok(())
    }
}

struct DeclarationListParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        // Rebuilt from the source with comments left out
        let mut raw = String::new();
        let mut segment = input.position();
        loop {
            let before = input.position();
            match input.next_including_whitespace_and_comments() {
                Ok(Token::Comment(_)) => {}
                Ok(_) => continue,
                Err(_) => break,
            }
            push_value_text(&mut raw, input.slice(segment..before));
            if !raw.is_empty() && !raw.ends_with(char::is_whitespace) {
                raw.push(' ');
            }
            segment = input.position();
        }
        push_value_text(&mut raw, input.slice_from(segment));

        let (value, important) = split_important(&raw);
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }

        let property = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        self.declarations
            .push(Declaration::new(property, value, important));
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Appends `text` without doubling the whitespace around a removed comment.
fn push_value_text(raw: &mut String, text: &str) {
    if raw.ends_with(char::is_whitespace) {
        raw.push_str(text.trim_start());
    } else {
        raw.push_str(text);
    }
}

/// Splits a trailing `!important` flag off a raw value.
fn split_important(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim();
    if let Some(bang) = trimmed.rfind('!')
        && trimmed[bang + 1..].trim().eq_ignore_ascii_case("important")
    {
        return (trimmed[..bang].trim_end(), true);
    }
    (trimmed, false)
}
