use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::{RuntimeError, Signal};
use crate::interpreter::Interpreter;
use crate::stmt::Stmt;
use crate::token::Token;
use crate::value::{Callable, Value};

/// A named function, method, bound method, or lambda. Lambdas are simply
/// unnamed `UserFunction`s; methods become bound copies via `bind`.
#[derive(Debug, Clone)]
pub struct UserFunction {
    pub name: Option<Token>,
    pub params: Vec<Token>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
    pub is_static: bool,
}

impl UserFunction {
    pub fn new(
        name: Option<Token>,
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
        is_static: bool,
    ) -> Self {
        UserFunction { name, params, body, closure, is_initializer, is_static }
    }

    /// Returns a copy of this function whose closure has `this` (and, for
    /// methods of a subclass, `super`) bound to `instance`.
    pub fn bind(&self, instance: Value) -> UserFunction {
        let env = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.closure)))));
        env.borrow_mut().define("this", instance);

        UserFunction {
            name: self.name.clone(),
            params: self.params.clone(),
            body: Rc::clone(&self.body),
            closure: env,
            is_initializer: self.is_initializer,
            is_static: self.is_static,
        }
    }
}

impl Callable for UserFunction {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let env = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.closure)))));

        for (param, arg) in self.params.iter().zip(args.into_iter()) {
            env.borrow_mut().define(&param.lexeme, arg);
        }

        let this_value = || self.closure.borrow().get_own("this").unwrap_or(Value::Nil);

        match interpreter.execute_block(&self.body, env) {
            Ok(()) => Ok(if self.is_initializer { this_value() } else { Value::Nil }),
            Err(Signal::Return(value)) => {
                Ok(if self.is_initializer { this_value() } else { value })
            }
            Err(Signal::Error(e)) => Err(e),
        }
    }

    fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("<fn {}>", name.lexeme),
            None => "<lambda>".to_string(),
        }
    }
}

impl fmt::Display for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A function implemented in Rust rather than in the interpreted language.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub function: fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.function)(interpreter, args)
    }

    fn describe(&self) -> String {
        format!("<native fn {}>", self.name)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// `clock`, `println`, and `input` — the interpreter's entire standard
/// library. `clock`/`println` are the pair the language semantics lean on
/// (timing tests, visible side effects); `input` is a convenience carried
/// over from the original implementation's native function set.
pub fn globals() -> Vec<NativeFunction> {
    vec![
        NativeFunction {
            name: "clock",
            arity: 0,
            function: |_, _| {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .expect("system clock to be after the unix epoch")
                    .as_secs_f64();
                Ok(Value::Number(now))
            },
        },
        NativeFunction {
            name: "println",
            arity: 1,
            function: |_, args| {
                println!("{}", args[0]);
                Ok(Value::Nil)
            },
        },
        NativeFunction {
            name: "input",
            arity: 0,
            function: |_, _| {
                let mut line = String::new();
                std::io::stdin().read_line(&mut line).unwrap_or(0);
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Ok(Value::String(line))
            },
        },
    ]
}
