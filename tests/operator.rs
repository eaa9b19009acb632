#[macro_use]
mod common;

#[cfg(test)]
mod operator {
    tests! {
        arithmetic in operator is OK
        "3"
        "2"
        "8"
        "2.5"
    }

    tests! {
        string_concat in operator is OK
        "foobar"
        "count: 3"
    }

    tests! {
        divide_by_zero in operator is ERR 70, "Cannot divide by zero."
    }

    tests! {
        comparison in operator is OK
        "true"
        "true"
        "false"
        "true"
        "true"
    }
}
