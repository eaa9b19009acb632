#[macro_use]
mod common;

#[cfg(test)]
mod inheritance {
    tests! {
        super_call in inheritance is OK
        "generic noise"
        "woof"
    }

    tests! {
        self_inherit_error in inheritance is ERR 65, "A class cannot inherit from itself."
    }
}
