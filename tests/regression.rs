#[macro_use]
mod common;

#[cfg(test)]
mod regression {
    tests! {
        undefined_variable in regression is ERR 70, "Undefined variable 'x'."
    }

    tests! {
        call_non_callable in regression is ERR 70, "Can only call functions and classes."
    }
}
