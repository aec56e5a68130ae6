//! Function importer
//!
//! Imports free functions, member functions, constructors, and
//! destructors. Declarations from other targets and deleted functions are
//! skipped silently, as are non-public members. Instance members grow a
//! synthetic leading `__this` parameter typed as a pointer to the class.
//! A parameter or return type that cannot be translated, or a by-value
//! record the ABI will not pass in registers, turns the whole function
//! into an `UnsupportedItem`.

use crate::ast::layout::can_pass_in_registers;
use crate::ast::mangle;
use crate::ast::{
    ConstructorKind, Decl, DeclKind, FunctionDecl, FunctionKind, FunctionLifetimes, QualType,
    RecordDecl, TranslationUnit, TypeKind,
};
use crate::importer::emit::{
    ORDER_CTOR_COPY, ORDER_CTOR_DEFAULT, ORDER_CTOR_MOVE, ORDER_CTOR_OTHER, ORDER_DTOR,
    ORDER_OTHER,
};
use crate::importer::{ImportError, Importer, names};
use crate::ir::{
    AccessSpecifier, Func, FuncParam, Identifier, Item, Lifetime, MemberFuncMetadata,
};

pub(crate) fn import_function(ctx: &mut Importer<'_>, decl: &Decl, func: &FunctionDecl) {
    if !ctx.is_from_current_target(decl) {
        return;
    }
    if func.is_deleted {
        return;
    }

    match build_func(ctx, decl, func) {
        Ok(Some(item)) => ctx.push_item(decl.range.begin, local_order(func), Item::Func(item)),
        // Non-public member: dropped without a trace.
        Ok(None) => {}
        Err(err) => ctx.push_unsupported(decl, err.to_string()),
    }
}

fn build_func(
    ctx: &Importer<'_>,
    decl: &Decl,
    func: &FunctionDecl,
) -> Result<Option<Func>, ImportError> {
    let lifetimes = func.lifetimes.as_ref();
    if let Some(annotations) = lifetimes {
        // The annotation tool asserts one lifetime list per parameter.
        if annotations.param_lifetimes.len() != func.params.len() {
            return Err(ImportError::UnsupportedConstruct(
                "Lifetime annotations do not match the parameter count".to_string(),
            ));
        }
    }

    let mut params = Vec::with_capacity(func.params.len() + 1);
    if func.kind.is_instance() {
        if let Some(record) = func.kind.member_of() {
            params.push(synthesize_this_param(ctx, record, lifetimes)?);
        }
    }

    for (index, param) in func.params.iter().enumerate() {
        let mut stack = lifetimes.map(|l| l.param_lifetimes[index].clone());
        let ty = ctx.map_type(&param.ty, stack.as_mut(), true)?;
        check_passable_by_value(ctx.tu, &param.ty)?;
        params.push(FuncParam {
            ty,
            identifier: names::param_identifier(&param.name, index),
        });
    }

    let mut return_stack = lifetimes.map(|l| l.return_lifetimes.clone());
    let return_type = ctx.map_type(&func.return_type, return_stack.as_mut(), true)?;
    check_passable_by_value(ctx.tu, &func.return_type)?;

    if let Some(access) = func.access {
        if access != AccessSpecifier::Public {
            return Ok(None);
        }
    }

    let name = names::function_name(func)?;
    let mangled_name = mangle::mangled_name(ctx.tu, func);
    let lifetime_params = collect_lifetime_params(lifetimes)?;
    let member_func_metadata = func.kind.member_of().map(|record| MemberFuncMetadata {
        record_id: ctx.ir_decl_id(record),
        instance_method: func.kind.is_instance(),
    });

    Ok(Some(Func {
        name,
        owning_target: ctx.owning_target(decl),
        doc_comment: ctx.doc_comment(decl),
        mangled_name,
        return_type,
        params,
        lifetime_params,
        is_inline: func.is_inline,
        member_func_metadata,
        source_loc: ctx.ir_source_loc(decl.range.begin),
    }))
}

/// Instance members take the object as a leading non-nullable pointer
/// parameter named `__this`.
fn synthesize_this_param(
    ctx: &Importer<'_>,
    record: crate::ast::DeclId,
    lifetimes: Option<&FunctionLifetimes>,
) -> Result<FuncParam, ImportError> {
    let class_name = ctx.tu.record_name(record).unwrap_or_default().to_string();
    let this_ty = QualType::pointer_to(QualType::record(record, class_name));
    let mut stack = lifetimes.map(|l| l.this_lifetimes.clone());
    let ty = ctx.map_type(&this_ty, stack.as_mut(), false)?;
    Ok(FuncParam {
        ty,
        identifier: Identifier::new("__this"),
    })
}

/// By-value records must be passable in registers; anything the ABI
/// lifts to memory has no sound binding.
fn check_passable_by_value(tu: &TranslationUnit, ty: &QualType) -> Result<(), ImportError> {
    let Some(record) = as_by_value_record(tu, ty) else {
        return Ok(());
    };
    if can_pass_in_registers(record) {
        Ok(())
    } else {
        Err(ImportError::UnsupportedConstruct(format!(
            "Type '{}' is not passable by value (not trivial for calls)",
            ty.spelling()
        )))
    }
}

/// The record behind `ty` when `ty` passes a record by value, looking
/// through typedefs but not through pointers or references.
fn as_by_value_record<'a>(tu: &'a TranslationUnit, ty: &QualType) -> Option<&'a RecordDecl> {
    let mut ty = ty;
    loop {
        match &ty.kind {
            TypeKind::Typedef { underlying, .. } => ty = underlying,
            TypeKind::Tag { decl, .. } => {
                return match &tu.decl(*decl)?.kind {
                    DeclKind::Record(record) => Some(record),
                    _ => None,
                };
            }
            _ => return None,
        }
    }
}

/// All distinct lifetimes referenced by the annotations, resolved to their
/// source names and sorted by name.
fn collect_lifetime_params(
    lifetimes: Option<&FunctionLifetimes>,
) -> Result<Vec<Lifetime>, ImportError> {
    let Some(annotations) = lifetimes else {
        return Ok(vec![]);
    };
    let mut ids = Vec::new();
    let all = annotations
        .this_lifetimes
        .iter()
        .chain(annotations.param_lifetimes.iter().flatten())
        .chain(annotations.return_lifetimes.iter());
    for id in all {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }
    let mut params = Vec::with_capacity(ids.len());
    for id in ids {
        let name = annotations.names.get(&id).ok_or_else(|| {
            ImportError::UnsupportedConstruct(format!("No name for lifetime {}", id.0))
        })?;
        params.push(Lifetime {
            name: name.clone(),
            id,
        });
    }
    params.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(params)
}

fn local_order(func: &FunctionDecl) -> u8 {
    match func.kind {
        FunctionKind::Constructor { kind, .. } => match kind {
            ConstructorKind::Default => ORDER_CTOR_DEFAULT,
            ConstructorKind::Copy => ORDER_CTOR_COPY,
            ConstructorKind::Move => ORDER_CTOR_MOVE,
            ConstructorKind::Other => ORDER_CTOR_OTHER,
        },
        FunctionKind::Destructor { .. } => ORDER_DTOR,
        FunctionKind::Free | FunctionKind::Method { .. } => ORDER_OTHER,
    }
}
