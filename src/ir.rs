// Strongly-typed binding descriptors for codegen. No registry or XML types here.
//
// Struct, class and command descriptors come from an external importer (see
// `manifest`); enum and option-set descriptors are lowered from the registry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CodegenError;

// ————————————————————————————————————————————————————————————————————————————
// DESCRIPTORS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumCase {
    pub name: String,
    pub value: String, // verbatim, sign prefix included
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub raw_type: String,
    pub cases: Vec<EnumCase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSetDescriptor {
    pub name: String,
    pub raw_type: String,
    pub cases: Vec<EnumCase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { name: name.into(), ty: ty.into() }
    }
}

/// The raw C struct a value type bridges to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CStructRef {
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDescriptor {
    pub name: String,
    pub c_struct: CStructRef,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub closure_generators: Vec<ClosureGen>,
    /// Paired positionally with `c_struct.members`.
    #[serde(default)]
    pub c_value_generators: Vec<ValueGen>,
}

/// Named reference a class holds to the object it was created from.
/// Composition, not inheritance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub name: String,
    pub reference_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    pub c_handle: String,
    #[serde(default = "default_true")]
    pub nullable_handle: bool,
    #[serde(default)]
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub commands: Vec<CommandDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub name: String,
    pub c_command: String,
    #[serde(default)]
    pub params: Vec<Member>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub closure_generators: Vec<ClosureGen>,
    /// One per C argument, in call order.
    #[serde(default)]
    pub c_value_generators: Vec<ValueGen>,
}

fn default_true() -> bool {
    true
}

fn default_return_type() -> String {
    "Void".to_string()
}

/// Everything one output file is generated from.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub enums: Vec<EnumDescriptor>,
    pub option_sets: Vec<OptionSetDescriptor>,
    pub structs: Vec<StructDescriptor>,
    pub classes: Vec<ClassDescriptor>,
}

// ————————————————————————————————————————————————————————————————————————————
// NAMING CONTEXT
// ————————————————————————————————————————————————————————————————————————————

/// Maps a logical member/parameter name to the expression holding its value
/// at the emission site (`self.x` inside a struct, `x` inside a method).
#[derive(Debug, Clone)]
pub struct NamingContext {
    scope: String,
    values: IndexMap<String, String>,
}

impl NamingContext {
    pub fn new(scope: impl Into<String>) -> Self {
        Self { scope: scope.into(), values: IndexMap::new() }
    }

    pub fn for_struct(descriptor: &StructDescriptor) -> Self {
        let mut ctx = Self::new(&descriptor.name);
        for member in &descriptor.members {
            ctx.bind(&member.name, format!("self.{}", member.name));
        }
        ctx
    }

    pub fn for_command(descriptor: &CommandDescriptor) -> Self {
        let mut ctx = Self::new(&descriptor.name);
        for param in &descriptor.params {
            ctx.bind(&param.name, param.name.clone());
        }
        ctx
    }

    pub fn bind(&mut self, name: impl Into<String>, expr: impl Into<String>) {
        self.values.insert(name.into(), expr.into());
    }

    pub fn get(&self, name: &str) -> Result<&str, CodegenError> {
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| CodegenError::UnboundName {
                name: name.to_string(),
                scope: self.scope.clone(),
            })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATORS
// ————————————————————————————————————————————————————————————————————————————

/// One nesting level: the statement opening a scoped acquisition and the
/// statement closing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureSpec {
    pub open: String,
    pub close: String,
}

impl ClosureSpec {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self { open: open.into(), close: close.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureKind {
    CString,
    OptionalCString,
    CStruct,
    OptionalCStruct,
    CStructBuffer,
    Buffer,
    OptionalBuffer,
}

impl ClosureKind {
    /// Method opening the scope and the prefix of the name it binds.
    fn method_and_binding(self) -> (&'static str, &'static str) {
        match self {
            Self::CString => ("withCString", "cString"),
            Self::OptionalCString => ("withOptionalCString", "cString"),
            Self::CStruct => ("withCStruct", "ptr"),
            Self::OptionalCStruct => ("withOptionalCStruct", "ptr"),
            Self::CStructBuffer => ("withCStructBufferPointer", "ptr"),
            Self::Buffer => ("withUnsafeBufferPointer", "ptr"),
            Self::OptionalBuffer => ("withOptionalUnsafeBufferPointer", "ptr"),
        }
    }
}

/// Acquires a temporary C representation of one member for the duration of
/// a nested scope, binding it as `<prefix>_<member>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureGen {
    pub kind: ClosureKind,
    pub member: String,
}

impl ClosureGen {
    pub fn new(kind: ClosureKind, member: impl Into<String>) -> Self {
        Self { kind, member: member.into() }
    }

    pub fn apply(&self, ctx: &NamingContext) -> Result<ClosureSpec, CodegenError> {
        let value = ctx.get(&self.member)?;
        let (method, prefix) = self.kind.method_and_binding();
        Ok(ClosureSpec::new(
            format!("{value}.{method} {{ {prefix}_{} in", self.member),
            "}",
        ))
    }
}

/// Produces the C-side expression for one struct field or call argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueGen {
    Direct { member: String },
    /// `x.rawValue`, for option sets passed as plain flags.
    RawValue { member: String },
    /// `VkFormat(rawValue: x.rawValue)`
    EnumCast { member: String, c_type: String },
    Bool32 { member: String },
    Handle { member: String },
    OptionalHandle { member: String },
    /// Names bound by an enclosing closure.
    CString { member: String },
    Pointer { member: String },
    BufferBase { member: String },
    BufferCount { member: String },
    Literal { text: String },
}

impl ValueGen {
    pub fn apply(&self, ctx: &NamingContext) -> Result<String, CodegenError> {
        let text = match self {
            Self::Direct { member } => ctx.get(member)?.to_string(),
            Self::RawValue { member } => format!("{}.rawValue", ctx.get(member)?),
            Self::EnumCast { member, c_type } => {
                format!("{c_type}(rawValue: {}.rawValue)", ctx.get(member)?)
            }
            Self::Bool32 { member } => {
                format!("VkBool32({} ? VK_TRUE : VK_FALSE)", ctx.get(member)?)
            }
            Self::Handle { member } => format!("{}.handle", ctx.get(member)?),
            Self::OptionalHandle { member } => format!("{}?.handle", ctx.get(member)?),
            Self::CString { member } => {
                ctx.get(member)?;
                format!("cString_{member}")
            }
            Self::Pointer { member } => {
                ctx.get(member)?;
                format!("ptr_{member}")
            }
            Self::BufferBase { member } => {
                ctx.get(member)?;
                format!("ptr_{member}.baseAddress")
            }
            Self::BufferCount { member } => {
                ctx.get(member)?;
                format!("UInt32(ptr_{member}.count)")
            }
            Self::Literal { text } => text.clone(),
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn struct_ctx() -> NamingContext {
        let mut ctx = NamingContext::new("ApplicationInfo");
        ctx.bind("pApplicationName", "self.pApplicationName");
        ctx.bind("flags", "self.flags");
        ctx
    }

    #[test]
    fn closure_generators_bind_member_names() {
        let ctx = struct_ctx();
        let spec = ClosureGen::new(ClosureKind::CString, "pApplicationName").apply(&ctx).unwrap();
        assert_eq!(spec.open, "self.pApplicationName.withCString { cString_pApplicationName in");
        assert_eq!(spec.close, "}");

        let mut params = NamingContext::new("createGraphicsPipelines");
        params.bind("pCreateInfos", "pCreateInfos");
        let spec = ClosureGen::new(ClosureKind::CStructBuffer, "pCreateInfos").apply(&params).unwrap();
        assert_eq!(spec.open, "pCreateInfos.withCStructBufferPointer { ptr_pCreateInfos in");
    }

    #[test]
    fn value_generators_follow_context() {
        let ctx = struct_ctx();
        let cases = [
            (ValueGen::Direct { member: "flags".into() }, "self.flags"),
            (ValueGen::RawValue { member: "flags".into() }, "self.flags.rawValue"),
            (
                ValueGen::EnumCast { member: "flags".into(), c_type: "VkFormat".into() },
                "VkFormat(rawValue: self.flags.rawValue)",
            ),
            (ValueGen::Bool32 { member: "flags".into() }, "VkBool32(self.flags ? VK_TRUE : VK_FALSE)"),
            (ValueGen::OptionalHandle { member: "flags".into() }, "self.flags?.handle"),
            (ValueGen::CString { member: "pApplicationName".into() }, "cString_pApplicationName"),
            (ValueGen::BufferCount { member: "flags".into() }, "UInt32(ptr_flags.count)"),
            (ValueGen::Literal { text: "nil".into() }, "nil"),
        ];
        for (generator, expected) in cases {
            assert_eq!(generator.apply(&ctx).unwrap(), expected);
        }
    }

    #[test]
    fn unbound_member_is_an_error() {
        let ctx = struct_ctx();
        let err = ValueGen::Pointer { member: "pNext".into() }.apply(&ctx).unwrap_err();
        assert_eq!(err.to_string(), "`pNext` is not bound in the naming context of `ApplicationInfo`");
        assert!(ClosureGen::new(ClosureKind::CStruct, "missing").apply(&ctx).is_err());
    }

    #[test]
    fn contexts_for_structs_and_commands() {
        let descriptor = StructDescriptor {
            name: "Extent2D".into(),
            c_struct: CStructRef { name: "VkExtent2D".into(), members: vec![] },
            members: vec![Member::new("width", "UInt32")],
            closure_generators: vec![],
            c_value_generators: vec![],
        };
        assert_eq!(NamingContext::for_struct(&descriptor).get("width").unwrap(), "self.width");

        let command = CommandDescriptor {
            name: "destroyFence".into(),
            c_command: "vkDestroyFence".into(),
            params: vec![Member::new("fence", "Fence?")],
            return_type: "Void".into(),
            closure_generators: vec![],
            c_value_generators: vec![],
        };
        assert_eq!(NamingContext::for_command(&command).get("fence").unwrap(), "fence");
    }

    #[test]
    fn generators_deserialize_from_tagged_json() {
        let value: ValueGen =
            serde_json::from_str(r#"{"kind": "enum_cast", "member": "format", "c_type": "VkFormat"}"#).unwrap();
        assert_eq!(value, ValueGen::EnumCast { member: "format".into(), c_type: "VkFormat".into() });
        let closure: ClosureGen =
            serde_json::from_str(r#"{"kind": "optional_c_string", "member": "pLayerName"}"#).unwrap();
        assert_eq!(closure.kind, ClosureKind::OptionalCString);
    }
}
