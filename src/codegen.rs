//! Swift emitter.
//!
//! `Codegen` owns the output buffer and the current indentation depth. Every
//! visitor writes whole lines; blocks are opened with [`Codegen::block`] and
//! nested scoped acquisitions with [`Codegen::with_closures`]. Depth changes
//! go through an [`IndentGuard`], so an error returned from deep inside a
//! nesting chain still leaves the depth where the caller had it.
use std::ops::{Deref, DerefMut};

use tracing::{debug, instrument};

use crate::error::CodegenError;
use crate::ir::{
    Bindings, ClassDescriptor, ClosureSpec, CommandDescriptor, EnumDescriptor, NamingContext,
    OptionSetDescriptor, StructDescriptor,
};
use crate::naming::safe_name;

const INDENT: &str = "    ";
const THROWS_KEYWORD: &str = "try";

type Result<T, E = CodegenError> = std::result::Result<T, E>;

#[derive(Debug, Default)]
pub struct Codegen {
    out: String,
    depth: usize,
}

/// Restores the depth it added when dropped.
pub struct IndentGuard<'a> {
    codegen: &'a mut Codegen,
}

impl Drop for IndentGuard<'_> {
    fn drop(&mut self) {
        self.codegen.depth -= 1;
    }
}

impl Deref for IndentGuard<'_> {
    type Target = Codegen;

    fn deref(&self) -> &Codegen {
        self.codegen
    }
}

impl DerefMut for IndentGuard<'_> {
    fn deref_mut(&mut self) -> &mut Codegen {
        self.codegen
    }
}

// ————————————————————————————————————————————————————————————————————————————
// WRITER
// ————————————————————————————————————————————————————————————————————————————

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Writes `text` at the current depth, one output line per input line.
    pub fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.out.push('\n');
            return;
        }
        for line in text.lines() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(line);
            self.out.push('\n');
        }
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    pub fn indented(&mut self) -> IndentGuard<'_> {
        self.depth += 1;
        IndentGuard { codegen: self }
    }

    /// `open`, then `body` one level deeper, then `close`.
    pub fn block(
        &mut self,
        open: &str,
        close: &str,
        body: impl FnOnce(&mut Codegen) -> Result<()>,
    ) -> Result<()> {
        self.line(open);
        body(&mut *self.indented())?;
        self.line(close);
        Ok(())
    }

    /// Opens every closure in order (prefixed with `try` when `throws`),
    /// runs `payload` at the innermost depth, then closes them in reverse.
    /// With no closures the payload runs at the current depth.
    pub fn with_closures(
        &mut self,
        closures: &[ClosureSpec],
        throws: bool,
        payload: impl FnOnce(&mut Codegen) -> Result<()>,
    ) -> Result<()> {
        let Some((outer, inner)) = closures.split_first() else {
            return payload(self);
        };
        if throws {
            self.line(&format!("{THROWS_KEYWORD} {}", outer.open));
        } else {
            self.line(&outer.open);
        }
        self.indented().with_closures(inner, throws, payload)?;
        self.line(&outer.close);
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VISITORS
// ————————————————————————————————————————————————————————————————————————————

impl Codegen {
    /// Imports, enums, option sets, structs, classes, in that order.
    pub fn emit_bindings(&mut self, imports: &[String], bindings: &Bindings) -> Result<()> {
        self.emit_imports(imports);
        for descriptor in &bindings.enums {
            self.emit_enum(descriptor);
        }
        for descriptor in &bindings.option_sets {
            self.emit_option_set(descriptor);
        }
        for descriptor in &bindings.structs {
            self.emit_struct(descriptor)?;
        }
        for descriptor in &bindings.classes {
            self.emit_class(descriptor)?;
        }
        debug!(
            enums = bindings.enums.len(),
            option_sets = bindings.option_sets.len(),
            structs = bindings.structs.len(),
            classes = bindings.classes.len(),
            bytes = self.out.len(),
            "emitted bindings"
        );
        Ok(())
    }

    pub fn emit_imports(&mut self, imports: &[String]) {
        if imports.is_empty() {
            return;
        }
        for module in imports {
            self.line(&format!("import {module}"));
        }
        self.blank();
    }

    pub fn emit_enum(&mut self, descriptor: &EnumDescriptor) {
        self.line(&format!("enum {}: {} {{", descriptor.name, descriptor.raw_type));
        {
            let mut body = self.indented();
            for case in &descriptor.cases {
                body.line(&format!("case {} = {}", safe_name(&case.name), case.value));
            }
        }
        self.line("}");
        self.blank();
    }

    pub fn emit_option_set(&mut self, descriptor: &OptionSetDescriptor) {
        let name = &descriptor.name;
        self.line(&format!("struct {name}: OptionSet {{"));
        {
            let mut body = self.indented();
            body.line(&format!("let rawValue: {}", descriptor.raw_type));
            for case in &descriptor.cases {
                body.line(&format!(
                    "static let {} = {name}(rawValue: {})",
                    safe_name(&case.name),
                    case.value
                ));
            }
        }
        self.line("}");
        self.blank();
    }

    #[instrument(level = "trace", skip_all, fields(name = %descriptor.name))]
    pub fn emit_struct(&mut self, descriptor: &StructDescriptor) -> Result<()> {
        let open = format!("struct {}: CStructConvertible {{", descriptor.name);
        self.block(&open, "}", |body| {
            body.line(&format!("typealias CStruct = {}", descriptor.c_struct.name));
            body.blank();
            for member in &descriptor.members {
                body.line(&format!("let {}: {}", safe_name(&member.name), member.ty));
            }
            body.blank();
            body.emit_struct_to_c_method(descriptor)
        })?;
        self.blank();
        Ok(())
    }

    fn emit_struct_to_c_method(&mut self, descriptor: &StructDescriptor) -> Result<()> {
        let c_name = &descriptor.c_struct.name;
        let fields = &descriptor.c_struct.members;
        if fields.len() != descriptor.c_value_generators.len() {
            return Err(CodegenError::GeneratorCountMismatch {
                scope: descriptor.name.clone(),
                fields: fields.len(),
                generators: descriptor.c_value_generators.len(),
            });
        }

        let ctx = NamingContext::for_struct(descriptor);
        let closures = descriptor
            .closure_generators
            .iter()
            .map(|generator| generator.apply(&ctx))
            .collect::<Result<Vec<_>>>()?;

        let open = format!(
            "func withCStruct<R>(_ body: (UnsafePointer<{c_name}>) throws -> R) rethrows -> R {{"
        );
        self.block(&open, "}", |method| {
            method.with_closures(&closures, true, |payload| {
                payload.line(&format!("var cStruct = {c_name}()"));
                for (field, generator) in fields.iter().zip(&descriptor.c_value_generators) {
                    let value = generator.apply(&ctx)?;
                    payload.line(&format!("cStruct.{} = {value}", field.name));
                }
                payload.line(&format!("return {THROWS_KEYWORD} body(&cStruct)"));
                Ok(())
            })
        })
    }

    #[instrument(level = "trace", skip_all, fields(name = %descriptor.name))]
    pub fn emit_class(&mut self, descriptor: &ClassDescriptor) -> Result<()> {
        let handle_type = class_handle_type(descriptor);
        let open = format!("class {} {{", descriptor.name);
        self.block(&open, "}", |body| {
            body.line(&format!("let handle: {handle_type}"));
            if let Some(parent) = &descriptor.parent {
                body.line(&format!("let {}: {}", parent.reference_name, parent.name));
            }

            body.blank();
            body.emit_class_init(descriptor, &handle_type)?;

            for command in &descriptor.commands {
                body.blank();
                body.emit_command(command)?;
            }
            Ok(())
        })?;
        self.blank();
        Ok(())
    }

    fn emit_class_init(&mut self, descriptor: &ClassDescriptor, handle_type: &str) -> Result<()> {
        let mut params = format!("handle: {handle_type}");
        if let Some(parent) = &descriptor.parent {
            params.push_str(&format!(", {}: {}", parent.reference_name, parent.name));
        }
        self.block(&format!("init({params}) {{"), "}", |body| {
            body.line("self.handle = handle");
            if let Some(parent) = &descriptor.parent {
                let reference = &parent.reference_name;
                body.line(&format!("self.{reference} = {reference}"));
            }
            Ok(())
        })
    }

    pub fn emit_command(&mut self, descriptor: &CommandDescriptor) -> Result<()> {
        let ctx = NamingContext::for_command(descriptor);
        let closures = descriptor
            .closure_generators
            .iter()
            .map(|generator| generator.apply(&ctx))
            .collect::<Result<Vec<_>>>()?;

        let params = descriptor
            .params
            .iter()
            .map(|param| format!("{}: {}", param.name, param.ty))
            .collect::<Vec<_>>()
            .join(", ");
        let open = format!("func {}({params}) -> {} {{", descriptor.name, descriptor.return_type);
        self.block(&open, "}", |body| {
            body.with_closures(&closures, false, |payload| {
                let args = descriptor
                    .c_value_generators
                    .iter()
                    .map(|generator| generator.apply(&ctx))
                    .collect::<Result<Vec<_>>>()?
                    .join(", ");
                payload.line(&format!("{}({args})", descriptor.c_command));
                Ok(())
            })
        })
    }
}

fn class_handle_type(descriptor: &ClassDescriptor) -> String {
    if descriptor.nullable_handle {
        format!("{}!", descriptor.c_handle)
    } else {
        descriptor.c_handle.clone()
    }
}
