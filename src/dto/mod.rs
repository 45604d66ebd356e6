pub mod submit_dto;
