//! Declaration nodes and the program root.

use super::{Expr, SymbolEntry, Type};

/// A whole program: `let <declarations> in <body>`, or just `<body>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    pub body: Expr,
}

impl Program {
    pub fn new(declarations: Vec<Declaration>, body: Expr) -> Self {
        Self { declarations, body }
    }

    /// A program without declarations.
    pub fn expr(body: Expr) -> Self {
        Self::new(Vec::new(), body)
    }
}

/// Declarations that may appear in a `let` block or a function's locals.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Var(VarDecl),
    Fun(FunDecl),
    Class(ClassDecl),
}

impl Declaration {
    pub fn var(name: impl Into<String>, ty: Type, init: Expr) -> Self {
        Declaration::Var(VarDecl {
            name: name.into(),
            ty,
            init,
            line: 0,
        })
    }

    pub fn fun(
        name: impl Into<String>,
        ret: Type,
        params: Vec<Param>,
        locals: Vec<Declaration>,
        body: Expr,
    ) -> Self {
        Declaration::Fun(FunDecl {
            name: name.into(),
            ret,
            params,
            locals,
            body,
            line: 0,
        })
    }

    /// Attach a source line.
    pub fn at(mut self, line: u32) -> Self {
        match &mut self {
            Declaration::Var(var) => var.line = line,
            Declaration::Fun(fun) => fun.line = line,
            Declaration::Class(class) => class.line = line,
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Declaration::Var(var) => &var.name,
            Declaration::Fun(fun) => &fun.name,
            Declaration::Class(class) => &class.name,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Declaration::Var(var) => var.line,
            Declaration::Fun(fun) => fun.line,
            Declaration::Class(class) => class.line,
        }
    }
}

impl From<ClassDecl> for Declaration {
    fn from(class: ClassDecl) -> Self {
        Declaration::Class(class)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub init: Expr,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Param>,
    pub locals: Vec<Declaration>,
    pub body: Expr,
    pub line: u32,
}

impl FunDecl {
    /// The function type declared by the signature.
    pub fn signature(&self) -> Type {
        Type::arrow(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.ret.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub line: u32,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            line: 0,
        }
    }
}

/// `class Name [extends Super] (fields) { methods }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub line: u32,
    /// Global entry of this class, holding its final class type and the slot
    /// of its dispatch pointer.
    pub entry: Option<SymbolEntry>,
    /// Global entry of the superclass as it was when this class was declared.
    pub super_entry: Option<SymbolEntry>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            fields: Vec::new(),
            methods: Vec::new(),
            line: 0,
            entry: None,
            super_entry: None,
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.push(FieldDecl::new(name, ty));
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn at(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
    /// Assigned by the resolver.
    pub offset: i32,
    pub line: u32,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            offset: 0,
            line: 0,
        }
    }

    pub fn at(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Param>,
    pub locals: Vec<Declaration>,
    pub body: Expr,
    /// Assigned by the resolver.
    pub offset: i32,
    pub line: u32,
}

impl MethodDecl {
    pub fn new(
        name: impl Into<String>,
        ret: Type,
        params: Vec<Param>,
        locals: Vec<Declaration>,
        body: Expr,
    ) -> Self {
        Self {
            name: name.into(),
            ret,
            params,
            locals,
            body,
            offset: 0,
            line: 0,
        }
    }

    pub fn at(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// The function type declared by the signature.
    pub fn signature(&self) -> super::ArrowType {
        super::ArrowType::new(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.ret.clone(),
        )
    }
}
