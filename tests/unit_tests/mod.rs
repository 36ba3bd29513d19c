mod dof_map;
mod quadrature;
