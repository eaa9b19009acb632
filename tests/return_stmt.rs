#[macro_use]
mod common;

#[cfg(test)]
mod return_stmt {
    tests! {
        return_outside_function in return is ERR 65, "Cannot return from top-level code."
    }

    tests! {
        return_value_in_initializer in return is ERR 65, "Cannot return a value from an initializer."
    }
}
