use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// A lexically nested set of name -> value bindings. Closures hold an
/// `Rc<RefCell<Environment>>` to their defining scope so captured
/// variables are shared by reference, not copied.
#[derive(Debug)]
pub struct Environment {
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new(enclosing: Option<Rc<RefCell<Environment>>>) -> Self {
        Environment { enclosing, values: HashMap::new() }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    fn ancestor(&self, distance: usize, self_rc: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        let mut environment = Rc::clone(self_rc);
        for _ in 0..distance {
            let parent = environment
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-computed distance to match the environment chain");
            environment = parent;
        }
        environment
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }

    /// Looks up a binding by raw name, checking only this environment's own
    /// map (no walk up the chain). Used to recover `this` from a bound
    /// method's closure after a call returns, where the name is known by
    /// construction rather than by a token from user source.
    pub fn get_own(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }
}

/// Static helpers that operate through a shared `Rc<RefCell<Environment>>`
/// handle, needed because `ancestor` must walk through other environments'
/// `RefCell` borrows rather than `&self`'s own.
pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &Token) -> Result<Value, RuntimeError> {
    if distance == 0 {
        return env.borrow().get(name);
    }
    let target = env.borrow().ancestor(distance, env);
    let value = target.borrow().values.get(&name.lexeme).cloned();
    value.ok_or_else(|| RuntimeError {
        token: name.clone(),
        message: format!("Undefined variable '{}'.", name.lexeme),
    })
}

/// Looks up a binding by raw name at a fixed scope distance, bypassing the
/// chain walk. Used for `super`/`this`, whose resolver-computed distances
/// are known to point at environments where the name is bound directly.
pub fn get_at_name(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
    if distance == 0 {
        return env.borrow().get_own(name);
    }
    let target = env.borrow().ancestor(distance, env);
    let value = target.borrow().values.get(name).cloned();
    value
}

pub fn assign_at(
    env: &Rc<RefCell<Environment>>,
    distance: usize,
    name: &Token,
    value: Value,
) -> Result<(), RuntimeError> {
    if distance == 0 {
        env.borrow_mut().values.insert(name.lexeme.clone(), value);
        return Ok(());
    }
    let target = env.borrow().ancestor(distance, env);
    target.borrow_mut().values.insert(name.lexeme.clone(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Kind;
    use std::rc::Rc as StdRc;

    fn token(name: &str) -> Token {
        Token::new(Kind::Identifier, name.to_string(), None, 0, 0, StdRc::from(name))
    }

    #[test]
    fn shadowing_and_assignment_through_enclosing_scope() {
        let global = Rc::new(RefCell::new(Environment::new(None)));
        global.borrow_mut().define("a", Value::Number(1.0));

        let local = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&global)))));
        assert_eq!(local.borrow().get(&token("a")).unwrap(), Value::Number(1.0));

        local.borrow_mut().assign(&token("a"), Value::Number(2.0)).unwrap();
        assert_eq!(global.borrow().get(&token("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let env = Environment::new(None);
        assert!(env.get(&token("missing")).is_err());
    }
}
