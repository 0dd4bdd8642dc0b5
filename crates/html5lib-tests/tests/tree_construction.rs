//! Tree-construction cases in the html5lib format.

use html5lib_tests::html5lib_tests;

html5lib_tests!("data/tree-construction/*.dat");
