#[macro_use]
mod common;

#[cfg(test)]
mod import {
    tests! {
        basic_import in import is OK
        "from lib"
    }

    tests! {
        self_import in import is ERR 65, "cannot import itself"
    }

    tests! {
        duplicate_import in import is ERR 65, "was already imported"
    }

    tests! {
        nested_import_error in import is ERR 65, "Imports are only allowed at the top level of a module."
    }
}
