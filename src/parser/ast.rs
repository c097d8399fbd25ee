//! Abstract Syntax Tree types for the template language

use crate::value::Value;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric + underscore, starts with letter/_)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sequence of sibling nodes
pub type NodeList = Vec<Spanned<Node>>;

/// Root AST node - a complete template
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: NodeList,
}

/// A template node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text
    Text(String),
    /// Variable output: `{{ expr }}`
    Variable(Expr),
    /// Conditional: `{% if [not] expr %} ... {% else %} ... {% endif %}`
    If(IfNode),
    /// Loop: `{% for a[, b] in expr %} ... {% endfor %}`
    For(ForNode),
    /// Sequential id: `{% generate_id 'prefix' [as name] %}`
    GenerateId(GenerateIdNode),
    /// `{% definecomponent name [key=expr ...] %} ... {% enddefinecomponent %}`
    ComponentDefine(ComponentDefine),
    /// `{% usecomponent name [key=expr ...] %} ... {% endusecomponent %}`
    ComponentUse(ComponentUse),
    /// `{% defineslot name %} default {% enddefineslot %}`
    SlotDeclare(SlotDeclare),
    /// `{% fillslot name %} content {% endfillslot %}`
    SlotFill(SlotFill),
}

/// Closed set of node kinds used by tree traversals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Variable,
    SlotDeclare,
    SlotFill,
    ComponentDefine,
    ComponentUse,
    Other,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text(_) => NodeKind::Text,
            Node::Variable(_) => NodeKind::Variable,
            Node::SlotDeclare(_) => NodeKind::SlotDeclare,
            Node::SlotFill(_) => NodeKind::SlotFill,
            Node::ComponentDefine(_) => NodeKind::ComponentDefine,
            Node::ComponentUse(_) => NodeKind::ComponentUse,
            Node::If(_) | Node::For(_) | Node::GenerateId(_) => NodeKind::Other,
        }
    }

    /// Child node lists, in document order
    pub fn children(&self) -> Vec<&[Spanned<Node>]> {
        match self {
            Node::Text(_) | Node::Variable(_) | Node::GenerateId(_) => vec![],
            Node::If(block) => vec![
                block.then_branch.as_slice(),
                block.else_branch.as_slice(),
            ],
            Node::For(block) => vec![block.body.as_slice()],
            Node::ComponentDefine(def) => vec![def.body.as_slice()],
            Node::ComponentUse(usage) => vec![usage.body.as_slice()],
            Node::SlotDeclare(slot) => vec![slot.body.as_slice()],
            Node::SlotFill(fill) => vec![fill.body.as_slice()],
        }
    }
}

/// Traversal control returned by a [`walk`] visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Visit this node's children
    Descend,
    /// Do not look inside this node
    Skip,
}

/// Depth-first pre-order traversal over a node list
pub fn walk<'a, F>(nodes: &'a [Spanned<Node>], visitor: &mut F)
where
    F: FnMut(&'a Spanned<Node>) -> Visit,
{
    for node in nodes {
        if visitor(node) == Visit::Descend {
            for children in node.node.children() {
                walk(children, visitor);
            }
        }
    }
}

/// Collect all descendant nodes of `kind`.
///
/// Nodes of kind `boundary` are neither collected nor descended into.
pub fn collect_kind<'a>(
    nodes: &'a [Spanned<Node>],
    kind: NodeKind,
    boundary: Option<NodeKind>,
) -> Vec<&'a Spanned<Node>> {
    let mut found = Vec::new();
    walk(nodes, &mut |node| {
        let node_kind = node.node.kind();
        if Some(node_kind) == boundary {
            return Visit::Skip;
        }
        if node_kind == kind {
            found.push(node);
        }
        Visit::Descend
    });
    found
}

/// Conditional block
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    pub negated: bool,
    pub condition: Expr,
    pub then_branch: NodeList,
    pub else_branch: NodeList,
}

/// Loop block
#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    /// One target binds the item; two targets unpack a pair
    pub targets: Vec<Spanned<Identifier>>,
    pub iterable: Expr,
    pub body: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateIdNode {
    pub prefix: Expr,
    pub target: Option<Spanned<Identifier>>,
}

/// `key=expr` argument on a component tag
#[derive(Debug, Clone, PartialEq)]
pub struct Kwarg {
    pub key: Spanned<Identifier>,
    pub value: Spanned<Expr>,
}

/// Component definition block
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDefine {
    pub name: Spanned<Identifier>,
    /// Default parameters, evaluated when the definition renders
    pub params: Vec<Kwarg>,
    pub body: NodeList,
}

/// Component use block
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentUse {
    pub name: Spanned<Identifier>,
    /// Use-site parameters, evaluated against the caller's context
    pub params: Vec<Kwarg>,
    /// Inner content; fill blocks are its direct children
    pub body: NodeList,
}

impl ComponentUse {
    /// Fill blocks given directly inside this use block
    pub fn fills(&self) -> impl Iterator<Item = &SlotFill> {
        self.body.iter().filter_map(|child| match &child.node {
            Node::SlotFill(fill) => Some(fill),
            _ => None,
        })
    }
}

/// Slot placeholder inside a component definition
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDeclare {
    pub name: Spanned<Identifier>,
    /// Rendered when the use site supplies no fill
    pub body: NodeList,
}

/// Use-site override for one slot
#[derive(Debug, Clone, PartialEq)]
pub struct SlotFill {
    pub name: Spanned<Identifier>,
    pub body: NodeList,
}

/// Expressions usable in variable tags, conditions and keyword arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String, number, `True`, `False` or `None`
    Literal(Value),
    /// Dotted variable lookup: `a.b.0`
    Lookup(Vec<PathSegment>),
    /// Filter application: `expr|name[:arg]`
    Filter {
        input: Box<Expr>,
        name: Spanned<Identifier>,
        arg: Option<Box<Expr>>,
    },
}

/// One step of a dotted lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}
