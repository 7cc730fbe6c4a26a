use crate::{errors::errors::Error, type_checker::typed_ast::TypedStmt};

use super::{compiler::Generator, expr::gen_expression};

/// Writes `statement` starting at the current position. Nested lines are
/// indented relative to the generator's depth.
pub fn gen_statement(generator: &mut Generator, statement: &TypedStmt) -> Result<(), Error> {
    match statement {
        TypedStmt::Expression(expression) => {
            gen_expression(generator, expression)?;
            generator.write(";");
        }
        TypedStmt::Declaration { variable, value } => {
            let declaration = format!(
                "{} {}",
                generator.type_name(variable.ty)?,
                variable.target_name
            );
            generator.write(&declaration);
            if let Some(value) = value {
                generator.write(" = ");
                gen_expression(generator, value)?;
            }
            generator.write(";");
        }
        TypedStmt::Assignment { receiver, value } => {
            gen_expression(generator, receiver)?;
            generator.write(" = ");
            gen_expression(generator, value)?;
            generator.write(";");
        }
        TypedStmt::If {
            condition,
            then_statements,
            else_statements,
        } => {
            generator.write("if (");
            gen_expression(generator, condition)?;
            generator.write(") ");
            generator.gen_body(then_statements)?;
            if !else_statements.is_empty() {
                generator.write(" else ");
                generator.gen_body(else_statements)?;
            }
        }
        TypedStmt::For {
            variable,
            value,
            statements,
        } => {
            // Loop variables are always Integer.
            generator.write(&format!("for (int {} : ", variable.target_name));
            gen_expression(generator, value)?;
            generator.write(") ");
            generator.gen_body(statements)?;
        }
        TypedStmt::While {
            condition,
            statements,
        } => {
            generator.write("while (");
            gen_expression(generator, condition)?;
            generator.write(") ");
            generator.gen_body(statements)?;
        }
        TypedStmt::Return(value) => {
            generator.write("return ");
            gen_expression(generator, value)?;
            generator.write(";");
        }
    }
    Ok(())
}
