#[macro_use]
mod common;

#[cfg(test)]
mod function {
    tests! {
        basic in function is OK
        "Hello, World!"
    }

    tests! {
        recursive_fib in function is OK
        "55"
    }

    tests! {
        wrong_arity in function is ERR 70, "Expected 2 arguments but got 1."
    }
}
