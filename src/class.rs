use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::function::UserFunction;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::{Callable, Value};

/// A class value. Classes are themselves callable (construction) and are
/// themselves a property-access target for static methods.
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<UserFunction>>,
    pub statics: HashMap<String, Rc<UserFunction>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<UserFunction>>,
        statics: HashMap<String, Rc<UserFunction>>,
    ) -> Self {
        Class { name, superclass, methods, statics }
    }

    /// Looks up an instance method, walking the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<UserFunction>> {
        self.methods
            .get(name)
            .cloned()
            .or_else(|| self.superclass.as_ref().and_then(|s| s.find_method(name)))
    }

    /// Looks up a static method, walking the superclass chain.
    pub fn find_static(&self, name: &str) -> Option<Rc<UserFunction>> {
        self.statics
            .get(name)
            .cloned()
            .or_else(|| self.superclass.as_ref().and_then(|s| s.find_static(name)))
    }

    /// Static-method property access on the class itself. Non-static
    /// members are not reachable this way.
    pub fn get(self_rc: &Rc<Class>, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(method) = self_rc.find_static(&name.lexeme) {
            return Ok(Value::Callable(Rc::new(method.bind(Value::Class(Rc::clone(self_rc))))));
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Only static methods can be accessed on a class, got '{}'.", name.lexeme),
        })
    }
}

impl Class {
    /// A class's arity is its initializer's arity, or 0 if it has none.
    /// Constructing instances goes through `construct` rather than the
    /// `Callable` trait: the interpreter already holds the `Rc<Class>` it
    /// dispatched on, and `construct` needs that same `Rc` (not a fresh
    /// `&self`) to bind `this` to the right instance.
    pub fn arity(&self) -> usize {
        self.find_method("init").map(|i| i.arity()).unwrap_or(0)
    }

    pub fn describe(&self) -> String {
        format!("<class {}>", self.name)
    }

    /// Constructs an instance, invoking `init` if the class (or an
    /// ancestor) defines one.
    pub fn construct(
        self_rc: &Rc<Class>,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(self_rc))));

        if let Some(initializer) = self_rc.find_method("init") {
            let bound = initializer.bind(Value::Instance(Rc::clone(&instance)));
            bound.call(interpreter, args)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// An instance of a class: a class pointer plus an open field map.
/// Fields shadow methods with the same name.
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance { class, fields: HashMap::new() }
    }

    pub fn get(self_rc: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value, RuntimeError> {
        let instance = self_rc.borrow();

        if let Some(field) = instance.fields.get(&name.lexeme) {
            return Ok(field.clone());
        }

        if let Some(method) = instance.class.find_method(&name.lexeme) {
            return Ok(Value::Callable(Rc::new(method.bind(Value::Instance(Rc::clone(self_rc))))));
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined property '{}'.", name.lexeme),
        })
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<instance {}>", self.class.name)
    }
}
