use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::environment::{assign_at, get_at, get_at_name, Environment};
use crate::error::{Diagnostics, RuntimeError, Signal};
use crate::expr::*;
use crate::function::{self, UserFunction};
use crate::stmt::*;
use crate::token::{Kind, Token};
use crate::value::{Callable, Value};

/// A stateful tree walker. Holds the global environment, the environment
/// currently in scope, and the resolver's table of lexical scope distances
/// keyed by expression node identity.
pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    resolutions: HashMap<ExprId, usize>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new(None)));
        for native in function::globals() {
            globals.borrow_mut().define(native.name, Value::from(native));
        }

        Interpreter { environment: Rc::clone(&globals), globals, resolutions: HashMap::new() }
    }

    /// Called by the resolver for every name reference it resolves to a
    /// local scope; absence from this table means "look it up globally".
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.resolutions.insert(id, depth);
    }

    pub fn interpret(&mut self, statements: &[Stmt], diagnostics: &mut Diagnostics) {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                Err(Signal::Error(e)) => {
                    diagnostics.runtime_error(&e.token, &e.message);
                    return;
                }
                Err(Signal::Return(_)) => {
                    diagnostics.debug_error("'return' reached the top level outside of any function");
                    return;
                }
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Signal> {
        stmt.accept(self)
    }

    /// Runs `statements` in a child scope of `env`, restoring the caller's
    /// environment before returning — including on an early return or error.
    pub fn execute_block(&mut self, statements: &[Stmt], env: Rc<RefCell<Environment>>) -> Result<(), Signal> {
        let previous = std::mem::replace(&mut self.environment, env);

        let mut result = Ok(());
        for statement in statements {
            if let Err(signal) = self.execute(statement) {
                result = Err(signal);
                break;
            }
        }

        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        expr.accept(self)
    }

    fn lookup_variable(&self, id: ExprId, name: &Token) -> Result<Value, RuntimeError> {
        match self.resolutions.get(&id) {
            Some(distance) => get_at(&self.environment, *distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn check_number(token: &Token, value: &Value) -> Result<f64, RuntimeError> {
        match value {
            Value::Number(n) => Ok(*n),
            _ => Err(RuntimeError { token: token.clone(), message: "Operand(s) must be a number.".to_string() }),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprVisitor<Result<Value, RuntimeError>> for Interpreter {
    fn visit_literal_expr(&mut self, value: &Value) -> Result<Value, RuntimeError> {
        Ok(value.clone())
    }

    fn visit_grouping_expr(&mut self, data: &GroupingData) -> Result<Value, RuntimeError> {
        self.evaluate(&data.expr)
    }

    fn visit_unary_expr(&mut self, data: &UnaryData) -> Result<Value, RuntimeError> {
        let right = self.evaluate(&data.expr)?;

        match data.operator.kind {
            Kind::Minus => Ok(Value::Number(-Self::check_number(&data.operator, &right)?)),
            Kind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("parser only produces '-'/'!' unary operators"),
        }
    }

    fn visit_binary_expr(&mut self, data: &BinaryData) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;
        let op = &data.operator;

        match op.kind {
            Kind::Greater => Ok(Value::Bool(Self::check_number(op, &left)? > Self::check_number(op, &right)?)),
            Kind::GreaterEqual => Ok(Value::Bool(Self::check_number(op, &left)? >= Self::check_number(op, &right)?)),
            Kind::Less => Ok(Value::Bool(Self::check_number(op, &left)? < Self::check_number(op, &right)?)),
            Kind::LessEqual => Ok(Value::Bool(Self::check_number(op, &left)? <= Self::check_number(op, &right)?)),
            Kind::BangEqual => Ok(Value::Bool(left != right)),
            Kind::EqualEqual => Ok(Value::Bool(left == right)),
            Kind::Minus => Ok(Value::Number(Self::check_number(op, &left)? - Self::check_number(op, &right)?)),
            Kind::Star => Ok(Value::Number(Self::check_number(op, &left)? * Self::check_number(op, &right)?)),
            Kind::Slash => {
                let (l, r) = (Self::check_number(op, &left)?, Self::check_number(op, &right)?);
                if r == 0.0 {
                    return Err(RuntimeError { token: op.clone(), message: "Cannot divide by zero.".to_string() });
                }
                Ok(Value::Number(l / r))
            }
            Kind::Plus => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!("{left}{right}"))),
                _ => Err(RuntimeError { token: op.clone(), message: "Operand(s) must be a number.".to_string() }),
            },
            _ => unreachable!("parser only produces comparison/arithmetic binary operators"),
        }
    }

    fn visit_logical_expr(&mut self, data: &LogicalData) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&data.left)?;

        let short_circuits = if data.operator.kind == Kind::Or { left.is_truthy() } else { !left.is_truthy() };

        if short_circuits {
            Ok(left)
        } else {
            self.evaluate(&data.right)
        }
    }

    fn visit_variable_expr(&mut self, data: &VariableData) -> Result<Value, RuntimeError> {
        self.lookup_variable(data.id, &data.name)
    }

    fn visit_assign_expr(&mut self, data: &AssignData) -> Result<Value, RuntimeError> {
        let value = self.evaluate(&data.value)?;

        match self.resolutions.get(&data.id) {
            Some(distance) => assign_at(&self.environment, *distance, &data.name, value.clone())?,
            None => self.globals.borrow_mut().assign(&data.name, value.clone())?,
        }

        Ok(value)
    }

    fn visit_call_expr(&mut self, data: &CallData) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let arity = match &callee {
            Value::Callable(callable) => callable.arity(),
            Value::Class(class) => class.arity(),
            _ => {
                return Err(RuntimeError {
                    token: data.paren.clone(),
                    message: "Can only call functions and classes.".to_string(),
                })
            }
        };

        if arguments.len() != arity {
            return Err(RuntimeError {
                token: data.paren.clone(),
                message: format!("Expected {arity} arguments but got {}.", arguments.len()),
            });
        }

        match callee {
            Value::Callable(callable) => callable.call(self, arguments),
            Value::Class(class) => Class::construct(&class, self, arguments),
            _ => unreachable!("non-callables already rejected above"),
        }
    }

    fn visit_lambda_expr(&mut self, data: &LambdaData) -> Result<Value, RuntimeError> {
        let function =
            UserFunction::new(None, data.params.clone(), Rc::new(data.body.clone()), Rc::clone(&self.environment), false, false);
        Ok(Value::from(Rc::new(function)))
    }

    fn visit_get_expr(&mut self, data: &GetData) -> Result<Value, RuntimeError> {
        let object = self.evaluate(&data.object)?;

        match object {
            Value::Instance(instance) => Instance::get(&instance, &data.name),
            Value::Class(class) => Class::get(&class, &data.name),
            _ => Err(RuntimeError {
                token: data.name.clone(),
                message: "Only instances and classes have properties.".to_string(),
            }),
        }
    }

    fn visit_set_expr(&mut self, data: &SetData) -> Result<Value, RuntimeError> {
        let object = self.evaluate(&data.object)?;

        match object {
            Value::Instance(instance) => {
                let value = self.evaluate(&data.value)?;
                instance.borrow_mut().set(&data.name, value.clone());
                Ok(value)
            }
            Value::Class(_) => {
                Err(RuntimeError { token: data.name.clone(), message: "Cannot set properties on a class.".to_string() })
            }
            _ => Err(RuntimeError { token: data.name.clone(), message: "Only instances have fields.".to_string() }),
        }
    }

    fn visit_this_expr(&mut self, data: &ThisData) -> Result<Value, RuntimeError> {
        self.lookup_variable(data.id, &data.keyword)
    }

    fn visit_super_expr(&mut self, data: &SuperData) -> Result<Value, RuntimeError> {
        let distance = *self
            .resolutions
            .get(&data.id)
            .expect("resolver to have recorded a scope distance for every 'super' expression");

        let superclass = get_at(&self.environment, distance, &data.keyword)?;
        let Value::Class(superclass) = superclass else {
            return Err(RuntimeError { token: data.keyword.clone(), message: "'super' did not resolve to a class.".to_string() });
        };

        // `this` is bound one scope closer to the method body than `super`.
        let instance = get_at_name(&self.environment, distance - 1, "this")
            .expect("'this' to be bound one scope inside every 'super' scope");

        let method = superclass.find_method(&data.method.lexeme).ok_or_else(|| RuntimeError {
            token: data.method.clone(),
            message: format!("Undefined property '{}'.", data.method.lexeme),
        })?;

        Ok(Value::from(Rc::new(method.bind(instance))))
    }
}

impl StmtVisitor<Result<(), Signal>> for Interpreter {
    fn visit_expression_stmt(&mut self, data: &ExpressionData) -> Result<(), Signal> {
        self.evaluate(&data.expr)?;
        Ok(())
    }

    fn visit_print_stmt(&mut self, data: &PrintData) -> Result<(), Signal> {
        let value = self.evaluate(&data.expr)?;
        println!("{value}");
        Ok(())
    }

    fn visit_var_stmt(&mut self, data: &VarData) -> Result<(), Signal> {
        let value = match &data.initializer {
            Some(initializer) => self.evaluate(initializer)?,
            None => Value::Nil,
        };

        self.environment.borrow_mut().define(&data.name.lexeme, value);
        Ok(())
    }

    fn visit_block_stmt(&mut self, data: &BlockData) -> Result<(), Signal> {
        let env = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.environment)))));
        self.execute_block(&data.statements, env)
    }

    fn visit_if_stmt(&mut self, data: &IfData) -> Result<(), Signal> {
        if self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.then_branch)
        } else if let Some(else_branch) = &data.else_branch {
            self.execute(else_branch)
        } else {
            Ok(())
        }
    }

    fn visit_while_stmt(&mut self, data: &WhileData) -> Result<(), Signal> {
        while self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.body)?;
        }
        Ok(())
    }

    fn visit_function_stmt(&mut self, data: &FunctionData) -> Result<(), Signal> {
        let function = UserFunction::new(
            Some(data.name.clone()),
            data.params.clone(),
            Rc::new(data.body.clone()),
            Rc::clone(&self.environment),
            false,
            false,
        );
        self.environment.borrow_mut().define(&data.name.lexeme, Value::from(Rc::new(function)));
        Ok(())
    }

    fn visit_return_stmt(&mut self, data: &ReturnData) -> Result<(), Signal> {
        let value = match &data.value {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };
        Err(Signal::Return(value))
    }

    fn visit_class_stmt(&mut self, data: &ClassData) -> Result<(), Signal> {
        let superclass = match &data.superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Value::Class(class) => Some(class),
                    _ => {
                        let token = match expr {
                            Expr::Variable(variable) => variable.name.clone(),
                            _ => data.name.clone(),
                        };
                        return Err(Signal::Error(RuntimeError {
                            token,
                            message: "Superclass must be a class.".to_string(),
                        }));
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(&data.name.lexeme, Value::Nil);

        let method_env = if let Some(superclass) = &superclass {
            let env = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.environment)))));
            env.borrow_mut().define("super", Value::Class(Rc::clone(superclass)));
            env
        } else {
            Rc::clone(&self.environment)
        };

        let previous = std::mem::replace(&mut self.environment, method_env);

        let mut methods = HashMap::new();
        let mut statics = HashMap::new();
        for method in &data.methods {
            let Stmt::Function(function_data) = method else {
                continue;
            };

            let is_static = function_data.prefixes.iter().any(|p| p.kind == Kind::Prefix);
            let is_initializer = !is_static && function_data.name.lexeme == "init";

            let user_fn = Rc::new(UserFunction::new(
                Some(function_data.name.clone()),
                function_data.params.clone(),
                Rc::new(function_data.body.clone()),
                Rc::clone(&self.environment),
                is_initializer,
                is_static,
            ));

            if is_static {
                statics.insert(function_data.name.lexeme.clone(), user_fn);
            } else {
                methods.insert(function_data.name.lexeme.clone(), user_fn);
            }
        }

        self.environment = previous;

        let class = Rc::new(Class::new(data.name.lexeme.clone(), superclass, methods, statics));
        self.environment.borrow_mut().assign(&data.name, Value::Class(class))?;
        Ok(())
    }

    fn visit_import_stmt(&mut self, _data: &ImportData) -> Result<(), Signal> {
        // No-op: the resolver already spliced the module's statements into
        // the execution queue ahead of this statement.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run(source: &str) -> (Interpreter, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens(&mut diagnostics);
        let mut parser = Parser::new(tokens);
        let statements = parser.parse(&mut diagnostics);

        let mut interpreter = Interpreter::new();
        let resolved = {
            let mut resolver = Resolver::new(&mut interpreter, &mut diagnostics, vec![], None);
            resolver.resolve_program(statements)
        };

        interpreter.interpret(&resolved, &mut diagnostics);
        (interpreter, diagnostics)
    }

    fn result_of(interpreter: &Interpreter) -> Value {
        interpreter.globals.borrow().get_own("result").expect("'result' to be defined")
    }

    fn eval(expr_source: &str) -> Value {
        let (interpreter, diagnostics) = run(&format!("var result = {expr_source};"));
        assert!(!diagnostics.had_error() && !diagnostics.had_runtime_error());
        result_of(&interpreter)
    }

    #[test]
    fn arithmetic_and_string_concatenation() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("\"a\" + \"b\""), Value::String("ab".to_string()));
        assert_eq!(eval("\"n=\" + 3"), Value::String("n=3".to_string()));
    }

    #[test]
    fn divide_by_zero_is_a_runtime_error() {
        let (_, diagnostics) = run("var x = 1 / 0;");
        assert!(diagnostics.had_runtime_error());
    }

    #[test]
    fn calling_with_wrong_arity_is_a_runtime_error() {
        let (_, diagnostics) = run("fun f(a, b) { return a + b; } f(1);");
        assert!(diagnostics.had_runtime_error());
    }

    #[test]
    fn closures_capture_variables_by_reference() {
        let source = r#"
            fun make_counter() {
                var count = 0;
                fun increment() {
                    count = count + 1;
                    return count;
                }
                return increment;
            }
            var counter = make_counter();
            counter();
            counter();
            var result = counter();
        "#;
        let (interpreter, diagnostics) = run(source);
        assert!(!diagnostics.had_error() && !diagnostics.had_runtime_error());
        assert_eq!(result_of(&interpreter), Value::Number(3.0));
    }

    #[test]
    fn constructing_an_instance_runs_init_and_binds_fields() {
        let source = r#"
            class Box {
                init(value) { this.value = value; }
            }
            var b = Box(5);
            var result = b.value;
        "#;
        let (interpreter, diagnostics) = run(source);
        assert!(!diagnostics.had_error() && !diagnostics.had_runtime_error());
        assert_eq!(result_of(&interpreter), Value::Number(5.0));
    }

    #[test]
    fn inheritance_dispatches_through_super() {
        let source = r#"
            class Animal {
                speak() { return "..."; }
            }
            class Dog < Animal {
                speak() {
                    return "Woof, says the " + super.speak();
                }
            }
            var result = Dog().speak();
        "#;
        let (interpreter, diagnostics) = run(source);
        assert!(!diagnostics.had_error() && !diagnostics.had_runtime_error());
        assert_eq!(result_of(&interpreter), Value::String("Woof, says the ...".to_string()));
    }

    #[test]
    fn static_methods_are_called_on_the_class_not_an_instance() {
        let source = r#"
            class Math {
                static square(n) { return n * n; }
            }
            var result = Math.square(4);
        "#;
        let (interpreter, diagnostics) = run(source);
        assert!(!diagnostics.had_error() && !diagnostics.had_runtime_error());
        assert_eq!(result_of(&interpreter), Value::Number(16.0));
    }
}
