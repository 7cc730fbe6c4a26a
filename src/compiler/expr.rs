use crate::{
    ast::expressions::{BinaryOp, Literal},
    errors::errors::Error,
    type_checker::typed_ast::{TypedExpr, TypedExprKind},
};

use super::compiler::Generator;

/// Generates the target source of the given expression.
pub fn gen_expression(generator: &mut Generator, expression: &TypedExpr) -> Result<(), Error> {
    match &expression.kind {
        TypedExprKind::Literal(literal) => generator.write(&gen_literal(literal)),
        TypedExprKind::Group(inner) => {
            generator.write("(");
            gen_expression(generator, inner)?;
            generator.write(")");
        }
        TypedExprKind::Binary {
            operator,
            left,
            right,
        } => {
            gen_expression(generator, left)?;
            let symbol = match operator {
                BinaryOp::And => "&&",
                BinaryOp::Or => "||",
                other => other.symbol(),
            };
            generator.write(&format!(" {} ", symbol));
            gen_expression(generator, right)?;
        }
        TypedExprKind::Access { receiver, variable } => {
            if let Some(receiver) = receiver {
                gen_expression(generator, receiver)?;
                generator.write(".");
            }
            generator.write(&variable.target_name);
        }
        TypedExprKind::Call {
            receiver,
            arguments,
            function,
        } => {
            if let Some(receiver) = receiver {
                gen_expression(generator, receiver)?;
                generator.write(".");
            }
            generator.write(&function.target_name);
            generator.write("(");
            for (index, argument) in arguments.iter().enumerate() {
                if index > 0 {
                    generator.write(", ");
                }
                gen_expression(generator, argument)?;
            }
            generator.write(")");
        }
    }
    Ok(())
}

fn gen_literal(literal: &Literal) -> String {
    match literal {
        Literal::Nil => String::from("null"),
        Literal::Boolean(value) => value.to_string(),
        Literal::Integer(value) => value.to_string(),
        Literal::Decimal(value) => value.to_string(),
        Literal::Character(value) => format!("'{}'", escape(*value, '\'')),
        Literal::String(value) => format!(
            "\"{}\"",
            value.chars().map(|c| escape(c, '"')).collect::<String>()
        ),
    }
}

/// Escapes `c` for a literal delimited by `quote`.
fn escape(c: char, quote: char) -> String {
    match c {
        '\\' => String::from("\\\\"),
        '\n' => String::from("\\n"),
        '\r' => String::from("\\r"),
        '\t' => String::from("\\t"),
        '\u{8}' => String::from("\\b"),
        '\u{c}' => String::from("\\f"),
        c if c == quote => format!("\\{}", c),
        c => c.to_string(),
    }
}
