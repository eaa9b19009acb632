#[macro_use]
mod common;

#[cfg(test)]
mod this_super {
    tests! {
        this_in_method in this_super is OK
        "Meow, I am Tom"
    }
}
