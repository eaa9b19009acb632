#[macro_use]
mod common;

#[cfg(test)]
mod class {
    tests! {
        fields_and_methods in class is OK
        "42"
    }

    tests! {
        to_string in class is OK
        "<class Foo>"
        "Foo instance"
    }

    tests! {
        static_method in class is OK
        "25"
    }

    tests! {
        set_on_class_error in class is ERR 70, "Cannot set properties on a class."
    }
}
