//! Equations
//!
//! Stores LaTeX source. Rendering is a pure substitution pass that turns the
//! common macros into Unicode and light markup; anything it does not recognize
//! passes through as text.

use crate::commands::{Command, CommandBus, CommandKind, HandlerId, PRIORITY_EDITOR};
use crate::editor::{Extension, Transaction};
use crate::error::Result;
use crate::formats::html::dom::{
    append_child, attr, create_element, element_name, has_class, html_escape, parse_fragment_nodes,
};
use crate::formats::json::SerializedNode;
use crate::node_type::{
    check_version, downcast, fields_from, fields_into, Conversion, ImportContext, NodeClass,
    NodePayload, NodeType,
};
use crate::tree::NodeKey;
use log::debug;
use markup5ever_rcdom::Handle;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const EQUATION_TYPE: &str = "equation";

/// Shown in place of an empty rendering
pub const EMPTY_EQUATION: &str = "∅";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Equation {
    pub equation: String,
    #[serde(default)]
    pub inline: bool,
}

static FRAC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\frac\{([^}]+)\}\{([^}]+)\}").expect("valid frac regex"));
static SQRT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\sqrt\{([^}]+)\}").expect("valid sqrt regex"));
static SUP_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^([0-9]+)").expect("valid superscript regex"));
static SUP_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^\{([^}]+)\}").expect("valid superscript group regex"));
static SUB_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([0-9]+)").expect("valid subscript regex"));
static SUB_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_\{([^}]+)\}").expect("valid subscript group regex"));

const SYMBOLS: &[(&str, &str)] = &[
    (r"\sum", "∑"),
    (r"\int", "∫"),
    (r"\infty", "∞"),
    (r"\alpha", "α"),
    (r"\beta", "β"),
    (r"\gamma", "γ"),
    (r"\delta", "δ"),
    (r"\epsilon", "ε"),
    (r"\theta", "θ"),
    (r"\lambda", "λ"),
    (r"\mu", "μ"),
    (r"\pi", "π"),
    (r"\sigma", "σ"),
    (r"\omega", "ω"),
    (r"\pm", "±"),
    (r"\times", "×"),
    (r"\div", "÷"),
    (r"\neq", "≠"),
    (r"\leq", "≤"),
    (r"\geq", "≥"),
    (r"\approx", "≈"),
];

/// Render LaTeX source to a markup string.
pub fn render_latex(latex: &str) -> String {
    let mut html = html_escape(latex);
    html = FRAC_RE
        .replace_all(
            &html,
            r#"<span class="frac"><span class="num">$1</span><span class="denom">$2</span></span>"#,
        )
        .into_owned();
    html = SQRT_RE
        .replace_all(&html, r#"√<span class="sqrt">$1</span>"#)
        .into_owned();
    for (macro_name, symbol) in SYMBOLS {
        html = html.replace(macro_name, symbol);
    }
    html = SUP_DIGITS_RE.replace_all(&html, "<sup>$1</sup>").into_owned();
    html = SUP_GROUP_RE.replace_all(&html, "<sup>$1</sup>").into_owned();
    html = SUB_DIGITS_RE.replace_all(&html, "<sub>$1</sub>").into_owned();
    SUB_GROUP_RE.replace_all(&html, "<sub>$1</sub>").into_owned()
}

/// Rendering shown to readers; empty source displays [`EMPTY_EQUATION`].
pub fn display_latex(latex: &str) -> String {
    let html = render_latex(latex);
    if html.is_empty() {
        EMPTY_EQUATION.to_string()
    } else {
        html
    }
}

pub struct EquationType;

impl NodeType for EquationType {
    fn type_tag(&self) -> &'static str {
        EQUATION_TYPE
    }

    fn class(&self) -> NodeClass {
        NodeClass::Decorator
    }

    fn create(&self) -> Box<dyn NodePayload> {
        Box::new(Equation::default())
    }

    fn import_json(&self, record: &SerializedNode) -> Result<Box<dyn NodePayload>> {
        check_version(self, record)?;
        Ok(Box::new(fields_into::<Equation>(record)?))
    }

    fn export_json(&self, payload: &dyn NodePayload) -> Result<Map<String, Value>> {
        fields_from(EQUATION_TYPE, downcast::<Equation>(EQUATION_TYPE, payload)?)
    }

    fn markup_tags(&self) -> &'static [&'static str] {
        &["span", "div"]
    }

    fn import_markup(&self, element: &Handle, _context: &ImportContext<'_>) -> Option<Conversion> {
        if !has_class(element, "equation") {
            return None;
        }
        let equation = attr(element, "data-equation")?;
        let inline = match attr(element, "data-inline").as_deref() {
            Some("true") => true,
            Some(_) => false,
            None => element_name(element).as_deref() == Some("span"),
        };
        Some(Conversion::node(1, Equation { equation, inline }, false))
    }

    fn export_markup(&self, payload: &dyn NodePayload) -> Result<Handle> {
        let equation = downcast::<Equation>(EQUATION_TYPE, payload)?;
        let tag = if equation.inline { "span" } else { "div" };
        let element = create_element(
            tag,
            vec![
                ("class", "equation"),
                ("data-equation", equation.equation.as_str()),
                ("data-inline", if equation.inline { "true" } else { "false" }),
            ],
        );
        for node in parse_fragment_nodes(&display_latex(&equation.equation))? {
            append_child(&element, node);
        }
        Ok(element)
    }

    fn is_inline(&self, payload: &dyn NodePayload) -> bool {
        downcast::<Equation>(EQUATION_TYPE, payload).is_ok_and(|e| e.inline)
    }

    fn describe(&self, payload: &dyn NodePayload) -> String {
        downcast::<Equation>(EQUATION_TYPE, payload)
            .map(|e| e.equation.clone())
            .unwrap_or_default()
    }
}

pub struct EquationExtension;

impl Extension for EquationExtension {
    fn name(&self) -> &'static str {
        "equation"
    }

    fn required_types(&self) -> &'static [&'static str] {
        &[EQUATION_TYPE]
    }

    fn register(&self, bus: &mut CommandBus) -> Vec<HandlerId> {
        vec![
            bus.register(CommandKind::InsertEquation, PRIORITY_EDITOR, insert_equation),
            bus.register(CommandKind::UpdateEquation, PRIORITY_EDITOR, update_equation),
        ]
    }
}

fn insert_equation(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::InsertEquation { equation, inline } = command else {
        return Ok(false);
    };
    let key = txn.create_node_with(
        EQUATION_TYPE,
        Equation {
            equation: equation.clone(),
            inline: *inline,
        },
    )?;
    if *inline {
        txn.insert_inline(key)?;
    } else {
        txn.insert_block(key)?;
    }
    debug!("event=insert module=equation key={key} inline={inline}");
    Ok(true)
}

fn update_equation(txn: &mut Transaction<'_>, command: &Command) -> Result<bool> {
    let Command::UpdateEquation { key, equation } = command else {
        return Ok(false);
    };
    let target: NodeKey = txn.target(*key)?;
    let Some(node) = txn.closest_of_type(target, EQUATION_TYPE) else {
        return Ok(false);
    };
    txn.tree_mut()
        .update_payload::<Equation, _>(node, |e| e.equation = equation.clone())?;
    Ok(true)
}
