//! Statement parsing and dependency graph assembly.
//!
//! Recognizes lines of the form `target[subscripts] = expression;` and
//! `target[subscripts] ~ expression;` and turns each into a [`Node`] whose
//! dependencies are the declared names referenced by the expression.

use indexmap::IndexMap;
use log::{debug, trace};
use winnow::{
    Parser as _,
    combinator::{alt, not, preceded, repeat, terminated},
    token::{take_till, take_until},
};

use stangraph_core::{
    declared::DeclaredSet,
    graph::{DependencyGraph, Node, Relation},
    identifier::Id,
};

use crate::{
    blocks::Block,
    lexical::{IResult, word, words, ws0},
};

/// `[n]`: a subscript holding a single word.
fn simple_subscript<'src>(input: &mut &'src str) -> IResult<&'src str> {
    ('[', word, ']').take().parse_next(input)
}

/// Any bracketed subscript, e.g. `[n, k]`.
fn subscript<'src>(input: &mut &'src str) -> IResult<&'src str> {
    ('[', take_till(0.., ']'), ']').take().parse_next(input)
}

/// `=` (but not `==`) or `~`.
fn operator(input: &mut &str) -> IResult<char> {
    alt((terminated('=', not('=')), '~')).parse_next(input)
}

/// A statement at the start of `input`: target, operator and the text up to
/// the first `;`.
fn statement<'src>(input: &mut &'src str) -> IResult<(&'src str, char, &'src str)> {
    (
        terminated(word, repeat(0.., (ws0, subscript)).map(|()| ())),
        preceded(ws0, operator),
        terminated(take_until(0.., ';'), ';'),
    )
        .parse_next(input)
}

/// Removes every `[word]` subscript from `line`.
///
/// ```text
/// y[n] ~ normal(mu[g], sigma);  =>  y ~ normal(mu, sigma);
/// ```
fn strip_simple_subscripts(line: &str) -> String {
    let mut input = line;
    let mut out = String::with_capacity(line.len());

    while !input.is_empty() {
        let segment = alt((simple_subscript.value(""), take_till(1.., '['), "["))
            .parse_next(&mut input);
        match segment {
            Ok(text) => out.push_str(text),
            Err(_) => {
                out.push_str(input);
                break;
            }
        }
    }

    out
}

/// Parses one line into the variable it defines and its node.
///
/// Returns `None` for lines that are not assignment or sampling statements.
/// Dependencies are the words of the expression that are in `declared`, in
/// first-occurrence order.
///
/// ```
/// use stangraph_core::{declared::DeclaredSet, graph::Relation, identifier::Id};
/// use stangraph_parser::parse_statement;
///
/// let mut declared = DeclaredSet::new();
/// declared.insert(Id::new("mu"), "parameters");
///
/// let (name, node) = parse_statement("  y ~ normal(mu, 1);", &declared).unwrap();
/// assert_eq!(name, Id::new("y"));
/// assert_eq!(node.relation(), Relation::Stochastic);
/// assert_eq!(node.expression(), "normal(mu, 1)");
/// assert!(node.depends_on(Id::new("mu")));
/// ```
pub fn parse_statement(line: &str, declared: &DeclaredSet) -> Option<(Id, Node)> {
    let line = strip_simple_subscripts(line.trim());
    let (target, operator, expression) = statement(&mut line.as_str()).ok()?;
    let relation = Relation::from_operator(operator)?;

    let expression = expression.trim();
    let dependencies = words(expression).filter_map(|token| declared.resolve(token));

    Some((Id::new(target), Node::new(relation, expression, dependencies)))
}

/// Parses every statement line of `body`. A later statement for the same
/// variable replaces the earlier one.
pub fn parse_statements(body: &str, declared: &DeclaredSet) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (name, node) in body
        .lines()
        .filter_map(|line| parse_statement(line, declared))
    {
        if graph.insert(name, node).is_some() {
            trace!(variable = name.to_string(); "Statement replaces earlier statement");
        }
    }
    graph
}

/// Parses the statements of all blocks into one graph, in block order.
pub fn build_dependency_graph(
    blocks: &IndexMap<String, Block>,
    declared: &DeclaredSet,
) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for block in blocks.values() {
        let block_graph = parse_statements(block.body(), declared);

        let block_declared: Vec<String> = declared
            .iter()
            .filter(|name| declared.block_of(*name) == Some(block.name()))
            .map(|name| name.to_string())
            .collect();
        let block_nodes: Vec<String> = block_graph
            .iter()
            .map(|(name, node)| format!("{name} {} {}", node.relation(), node.expression()))
            .collect();
        debug!(
            block = block.name(),
            declared:? = block_declared,
            nodes:? = block_nodes;
            "Block parsed"
        );

        graph.merge(block_graph);
    }

    graph
}
