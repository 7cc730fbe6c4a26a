//! Main generator module.
//!
//! This module contains the Generator structure, which renders a typed
//! program as the source of a single target-language class. It owns the
//! output buffer and the current indentation depth.

use tracing::instrument;

use crate::{
    environment::types::{TypeId, TypeRegistry},
    errors::errors::Error,
    type_checker::typed_ast::{TypedExpr, TypedField, TypedMethod, TypedSource, TypedStmt},
};

use super::{expr::gen_expression, stmt::gen_statement};

/// Layout options of the generated source.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorOptions {
    /// Name of the generated class.
    pub class_name: String,
    /// Text written once per indentation level.
    pub indent: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            class_name: String::from("Main"),
            indent: String::from("    "),
        }
    }
}

/// The generator state.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the registry the typed program was checked against
pub struct Generator<'a> {
    /// Registry resolving the type annotations of the typed program
    pub registry: &'a TypeRegistry,
    pub options: GeneratorOptions,
    output: String,
    depth: usize,
}

impl<'a> Generator<'a> {
    pub fn new(registry: &'a TypeRegistry, options: GeneratorOptions) -> Self {
        Generator {
            registry,
            options,
            output: String::new(),
            depth: 0,
        }
    }

    /// Consumes the generator and returns what it has written.
    pub fn finish(self) -> String {
        self.output
    }

    pub fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Starts a new line at the current depth.
    pub fn newline(&mut self) {
        self.output.push('\n');
        for _ in 0..self.depth {
            self.output.push_str(&self.options.indent);
        }
    }

    /// Ends the current line without indenting the next one.
    fn blank_line(&mut self) {
        self.output.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Target spelling of `ty`.
    pub fn type_name(&self, ty: TypeId) -> Result<&str, Error> {
        Ok(&self.registry.get(ty)?.target_name)
    }

    /// Writes `{`, the statements one per line, then `}`. An empty body is
    /// written as `{}`.
    pub fn gen_body(&mut self, statements: &[TypedStmt]) -> Result<(), Error> {
        self.write("{");
        if statements.is_empty() {
            self.write("}");
            return Ok(());
        }

        self.indent();
        for statement in statements {
            self.newline();
            gen_statement(self, statement)?;
        }
        self.dedent();
        self.newline();
        self.write("}");
        Ok(())
    }

    #[instrument(level = "debug", skip_all)]
    pub fn gen_source(&mut self, source: &TypedSource) -> Result<(), Error> {
        let class_name = self.options.class_name.clone();
        self.write(&format!("public class {} {{", class_name));
        self.blank_line();
        self.indent();

        if !source.fields.is_empty() {
            for field in &source.fields {
                self.newline();
                self.gen_field(field)?;
            }
            self.blank_line();
        }

        self.newline();
        self.write("public static void main(String[] args) {");
        self.indent();
        self.newline();
        self.write(&format!("System.exit(new {}().main());", class_name));
        self.dedent();
        self.newline();
        self.write("}");

        for method in &source.methods {
            self.blank_line();
            self.newline();
            self.gen_method(method)?;
        }

        self.dedent();
        self.blank_line();
        self.newline();
        self.write("}");
        Ok(())
    }

    fn gen_field(&mut self, field: &TypedField) -> Result<(), Error> {
        let declaration = format!(
            "{} {}",
            self.type_name(field.variable.ty)?,
            field.variable.target_name
        );
        self.write(&declaration);
        if let Some(value) = &field.value {
            self.write(" = ");
            gen_expression(self, value)?;
        }
        self.write(";");
        Ok(())
    }

    fn gen_method(&mut self, method: &TypedMethod) -> Result<(), Error> {
        let function = &method.function;
        let return_type = if function.return_type == self.registry.builtins().nil {
            "void"
        } else {
            self.type_name(function.return_type)?
        };

        let parameters = method
            .parameters
            .iter()
            .zip(&function.parameter_types)
            .map(|(name, ty)| -> Result<String, Error> {
                Ok(format!("{} {}", self.type_name(*ty)?, name))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let signature = format!(
            "{} {}({}) ",
            return_type,
            function.target_name,
            parameters.join(", ")
        );
        self.write(&signature);
        self.gen_body(&method.statements)
    }
}

/// Renders a typed program with the default options.
pub fn generate(registry: &TypeRegistry, source: &TypedSource) -> Result<String, Error> {
    let mut generator = Generator::new(registry, GeneratorOptions::default());
    generator.gen_source(source)?;
    Ok(generator.finish())
}

/// Renders a single statement at depth zero.
pub fn generate_stmt(registry: &TypeRegistry, statement: &TypedStmt) -> Result<String, Error> {
    let mut generator = Generator::new(registry, GeneratorOptions::default());
    gen_statement(&mut generator, statement)?;
    Ok(generator.finish())
}

/// Renders a single expression.
pub fn generate_expr(registry: &TypeRegistry, expression: &TypedExpr) -> Result<String, Error> {
    let mut generator = Generator::new(registry, GeneratorOptions::default());
    gen_expression(&mut generator, expression)?;
    Ok(generator.finish())
}
