// APU test suite

mod triangle_tests;
