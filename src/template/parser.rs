//! Tag-level parser for `.tmpl` source files.
//!
//! Produces a raw node tree in which `{{> name}}` inclusions are still
//! symbolic; the registry resolves those at build time.

use thiserror::Error;

/// Errors produced while parsing a single template source.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unclosed '{{{{' delimiter at byte {0}")]
    UnclosedDelimiter(usize),

    #[error("empty tag")]
    EmptyTag,

    #[error("unclosed block '{{{{#{0}}}}}'")]
    UnclosedBlock(String),

    #[error("close tag '{{{{/{0}}}}}' without a matching open tag")]
    UnexpectedClose(String),

    #[error("mismatched close tag: expected '{{{{/{expected}}}}}', found '{{{{/{found}}}}}'")]
    MismatchedClose { expected: String, found: String },

    #[error("'{{{{else}}}}' outside of an if block")]
    UnexpectedElse,

    #[error("invalid reference path '{0}'")]
    InvalidPath(String),

    #[error("invalid partial name '{0}'")]
    InvalidPartialName(String),
}

/// A parsed template node. `Include` nodes are placeholders that the
/// registry splices away during compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable(Vec<String>),
    Each {
        path: Vec<String>,
        body: Vec<Node>,
    },
    If {
        path: Vec<String>,
        then_body: Vec<Node>,
        else_body: Vec<Node>,
    },
    Include(String),
}

enum FrameKind {
    Root,
    Each {
        path: Vec<String>,
    },
    If {
        path: Vec<String>,
        // Filled in when an {{else}} tag is seen; the frame's node list
        // then collects the else branch.
        then_body: Option<Vec<Node>>,
    },
}

struct Frame {
    kind: FrameKind,
    nodes: Vec<Node>,
}

impl Frame {
    fn block_name(&self) -> &'static str {
        match self.kind {
            FrameKind::Root => "",
            FrameKind::Each { .. } => "each",
            FrameKind::If { .. } => "if",
        }
    }
}

/// Parse template source into a node tree.
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    let mut stack = vec![Frame {
        kind: FrameKind::Root,
        nodes: Vec::new(),
    }];

    let mut rest = source;
    let mut offset = 0usize;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            push_text(&mut stack, &rest[..open]);
        }

        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or(ParseError::UnclosedDelimiter(offset + open))?;

        handle_tag(&mut stack, after[..close].trim())?;

        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    if !rest.is_empty() {
        push_text(&mut stack, rest);
    }

    if stack.len() > 1 {
        let top = stack.last().unwrap();
        return Err(ParseError::UnclosedBlock(format!(
            "{} {}",
            top.block_name(),
            block_path(&top.kind).join(".")
        )));
    }

    Ok(stack.pop().unwrap().nodes)
}

fn block_path(kind: &FrameKind) -> &[String] {
    match kind {
        FrameKind::Root => &[],
        FrameKind::Each { path } => path,
        FrameKind::If { path, .. } => path,
    }
}

fn push_text(stack: &mut [Frame], text: &str) {
    stack
        .last_mut()
        .unwrap()
        .nodes
        .push(Node::Text(text.to_string()));
}

fn handle_tag(stack: &mut Vec<Frame>, tag: &str) -> Result<(), ParseError> {
    if tag.is_empty() {
        return Err(ParseError::EmptyTag);
    }

    if let Some(path) = tag.strip_prefix("#each ") {
        stack.push(Frame {
            kind: FrameKind::Each {
                path: parse_path(path.trim())?,
            },
            nodes: Vec::new(),
        });
        return Ok(());
    }

    if let Some(path) = tag.strip_prefix("#if ") {
        stack.push(Frame {
            kind: FrameKind::If {
                path: parse_path(path.trim())?,
                then_body: None,
            },
            nodes: Vec::new(),
        });
        return Ok(());
    }

    if tag == "else" {
        let top = stack.last_mut().unwrap();
        match &mut top.kind {
            FrameKind::If { then_body, .. } if then_body.is_none() => {
                *then_body = Some(std::mem::take(&mut top.nodes));
                Ok(())
            }
            _ => Err(ParseError::UnexpectedElse),
        }
    } else if let Some(name) = tag.strip_prefix('/') {
        close_block(stack, name.trim())
    } else if let Some(name) = tag.strip_prefix('>') {
        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(ParseError::InvalidPartialName(name.to_string()));
        }
        stack
            .last_mut()
            .unwrap()
            .nodes
            .push(Node::Include(name.to_string()));
        Ok(())
    } else {
        let path = parse_path(tag)?;
        stack.last_mut().unwrap().nodes.push(Node::Variable(path));
        Ok(())
    }
}

fn close_block(stack: &mut Vec<Frame>, name: &str) -> Result<(), ParseError> {
    let top = stack.last().unwrap();
    let expected = top.block_name();

    if expected.is_empty() {
        return Err(ParseError::UnexpectedClose(name.to_string()));
    }
    if name != expected {
        return Err(ParseError::MismatchedClose {
            expected: expected.to_string(),
            found: name.to_string(),
        });
    }

    let frame = stack.pop().unwrap();
    let node = match frame.kind {
        FrameKind::Each { path } => Node::Each {
            path,
            body: frame.nodes,
        },
        FrameKind::If { path, then_body } => match then_body {
            Some(then_body) => Node::If {
                path,
                then_body,
                else_body: frame.nodes,
            },
            None => Node::If {
                path,
                then_body: frame.nodes,
                else_body: Vec::new(),
            },
        },
        FrameKind::Root => unreachable!("root frame is never popped"),
    };

    stack.last_mut().unwrap().nodes.push(node);
    Ok(())
}

fn parse_path(raw: &str) -> Result<Vec<String>, ParseError> {
    let segments: Vec<String> = raw.split('.').map(str::to_string).collect();

    let valid = !raw.is_empty()
        && segments.iter().all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
        });

    if !valid {
        return Err(ParseError::InvalidPath(raw.to_string()));
    }
    Ok(segments)
}
