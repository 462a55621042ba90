//! Decorators carried through from the AST onto graph nodes

use crate::metamodel::{DecoratorArg, DecoratorAst};

/// A decorator application attached to a declaration or property
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    name: String,
    arguments: Vec<DecoratorArg>,
}

impl Decorator {
    /// Build from the AST node
    pub fn from_ast(ast: &DecoratorAst) -> Self {
        Self {
            name: ast.name.clone(),
            arguments: ast.arguments.clone(),
        }
    }

    /// The decorator name (without the `@`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional arguments in declaration order
    pub fn arguments(&self) -> &[DecoratorArg] {
        &self.arguments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ast() {
        let ast = DecoratorAst {
            name: "range".to_string(),
            arguments: vec![DecoratorArg::Integer(1), DecoratorArg::Integer(10)],
        };
        let decorator = Decorator::from_ast(&ast);
        assert_eq!(decorator.name(), "range");
        assert_eq!(decorator.arguments().len(), 2);
    }
}
