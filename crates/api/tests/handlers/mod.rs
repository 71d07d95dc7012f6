mod accounts_test;
mod appointments_test;
mod availability_test;
mod middleware_test;
