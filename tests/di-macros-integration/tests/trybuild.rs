//! trybuild 编译期测试

#[test]
fn trybuild_injectable() {
    let t = trybuild::TestCases::new();
    t.pass("tests/trybuild/ok_injectable.rs");
    t.pass("tests/trybuild/ok_tuple_struct.rs");
}
