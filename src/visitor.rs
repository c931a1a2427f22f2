//! Pre-order traversal over element trees.
//!
//! [`traverse`] walks an element with an explicit work stack, so arbitrarily
//! deep trees never grow the call stack. Children are visited in schema field
//! order, list entries in list order with their index.
//!
//! Per node the hooks fire as:
//! `pre_visit` (gate for the whole node) → `enter` (gate for descending) →
//! children → `leave` → `post_visit`. `leave` always follows an `enter`, even
//! when `enter` declined to descend or the visitor asked to abort.

use crate::types::{Element, FieldValue, Primitive, Value};

pub trait Visitor {
    /// Return `false` to skip this node entirely, hooks and children alike.
    fn pre_visit(&mut self, _element: &Element) -> bool {
        true
    }

    /// Return `false` to skip the children of this node; siblings are still visited.
    fn enter(&mut self, _name: &str, _index: Option<usize>, _element: &Element) -> bool {
        true
    }

    fn leave(&mut self, _name: &str, _index: Option<usize>, _element: &Element) {}

    fn post_visit(&mut self, _element: &Element) {}

    fn enter_list(&mut self, _name: &str, _values: &[Value]) {}

    fn leave_list(&mut self, _name: &str, _values: &[Value]) {}

    fn visit_primitive(&mut self, _name: &str, _index: Option<usize>, _primitive: &Primitive) {}

    /// Checked before every node; once `true`, no further node is entered.
    fn should_abort(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraversalOutcome {
    /// Number of element nodes whose `enter` hook ran.
    pub nodes_visited: usize,
    pub aborted: bool,
}

enum Frame<'a> {
    Node {
        name: &'a str,
        index: Option<usize>,
        element: &'a Element,
    },
    Leave {
        name: &'a str,
        index: Option<usize>,
        element: &'a Element,
    },
    Primitive {
        name: &'a str,
        index: Option<usize>,
        primitive: &'a Primitive,
    },
    ListStart {
        name: &'a str,
        values: &'a [Value],
    },
    ListEnd {
        name: &'a str,
        values: &'a [Value],
    },
}

impl<'a> Frame<'a> {
    fn for_value(name: &'a str, index: Option<usize>, value: &'a Value) -> Self {
        match value {
            Value::Element(element) => Frame::Node {
                name,
                index,
                element,
            },
            Value::Primitive(primitive) => Frame::Primitive {
                name,
                index,
                primitive,
            },
        }
    }

    /// Closing frames still run after an abort so open hooks stay balanced.
    fn is_closing(&self) -> bool {
        matches!(self, Frame::Leave { .. } | Frame::ListEnd { .. })
    }
}

/// Traverse `element`, naming the root after its schema (`compose` for `ValueSet.compose`).
pub fn traverse<V: Visitor + ?Sized>(element: &Element, visitor: &mut V) -> TraversalOutcome {
    traverse_named(element.schema().element_name(), element, visitor)
}

pub fn traverse_named<V: Visitor + ?Sized>(
    name: &str,
    element: &Element,
    visitor: &mut V,
) -> TraversalOutcome {
    let mut outcome = TraversalOutcome::default();
    let mut stack = vec![Frame::Node {
        name,
        index: None,
        element,
    }];

    while let Some(frame) = stack.pop() {
        if outcome.aborted && !frame.is_closing() {
            continue;
        }

        match frame {
            Frame::Node {
                name,
                index,
                element,
            } => {
                if visitor.should_abort() {
                    outcome.aborted = true;
                    continue;
                }
                if !visitor.pre_visit(element) {
                    continue;
                }
                outcome.nodes_visited += 1;
                let descend = visitor.enter(name, index, element);
                stack.push(Frame::Leave {
                    name,
                    index,
                    element,
                });
                if descend {
                    push_children(&mut stack, element);
                }
            }
            Frame::Leave {
                name,
                index,
                element,
            } => {
                visitor.leave(name, index, element);
                visitor.post_visit(element);
            }
            Frame::Primitive {
                name,
                index,
                primitive,
            } => visitor.visit_primitive(name, index, primitive),
            Frame::ListStart { name, values } => {
                visitor.enter_list(name, values);
                stack.push(Frame::ListEnd { name, values });
                for (position, value) in values.iter().enumerate().rev() {
                    stack.push(Frame::for_value(name, Some(position), value));
                }
            }
            Frame::ListEnd { name, values } => visitor.leave_list(name, values),
        }
    }

    outcome
}

fn push_children<'a>(stack: &mut Vec<Frame<'a>>, element: &'a Element) {
    for (descriptor, value) in element.fields().rev() {
        let name = descriptor.name.as_str();
        match value {
            FieldValue::Single(value) => stack.push(Frame::for_value(name, None, value)),
            FieldValue::List(values) => stack.push(Frame::ListStart { name, values }),
        }
    }
}

/// Collects every element of one type, in traversal order.
#[derive(Debug)]
pub struct CollectingVisitor {
    type_name: String,
    result: Vec<Element>,
}

impl CollectingVisitor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            result: Vec::new(),
        }
    }

    pub fn result(&self) -> &[Element] {
        &self.result
    }

    pub fn into_result(self) -> Vec<Element> {
        self.result
    }
}

impl Visitor for CollectingVisitor {
    fn enter(&mut self, _name: &str, _index: Option<usize>, element: &Element) -> bool {
        if element.type_name() == self.type_name {
            self.result.push(element.clone());
        }
        true
    }
}
