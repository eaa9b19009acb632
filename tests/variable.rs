#[macro_use]
mod common;

#[cfg(test)]
mod variable {
    tests! {
        global in variable is OK
        "before"
        "after"
    }

    tests! {
        uninitialized in variable is OK
        "nil"
    }

    tests! {
        local_redeclare in variable is ERR 65, "already defined"
    }
}
