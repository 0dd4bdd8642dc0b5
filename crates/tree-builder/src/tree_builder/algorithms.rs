use super::{
    insertion::InsertionPlace,
    stack_of_open_elements::Scope,
    token::{Step, Tag, Token},
    InsertionMode, TreeBuilder,
};
use crate::{
    atom::Atom,
    attributes::Attributes,
    element_name::{DispatchGroup, ElementName, TagName},
    error::{ParseErrorKind, TreeBuilderError},
    namespace::Namespace,
    sink::TreeSink,
    tokenizer_control::LexicalState,
};
use std::rc::Rc;

/// > If formatting element is not in the stack of open elements ... outer loop counter
/// > is greater than or equal to 8, then return.
const ADOPTION_AGENCY_OUTER_LOOP_LIMIT: usize = 8;

/// > If inner loop counter is greater than 3 and node is in the list of active
/// > formatting elements, then remove node from the list of active formatting elements.
const ADOPTION_AGENCY_INNER_LOOP_LIMIT: usize = 3;

impl<S: TreeSink> TreeBuilder<S> {
    /// Reconstructs the active formatting elements.
    ///
    /// > This has the effect of reopening all the formatting elements that were opened
    /// > in the current body, cell, or caption (whichever is youngest) that haven't
    /// > been explicitly closed.
    ///
    /// @see https://html.spec.whatwg.org/#reconstruct-the-active-formatting-elements
    pub(super) fn reconstruct_active_formatting_elements(&mut self) {
        let formatting = &self.state.formatting;

        /*
         * > 1. If there are no entries in the list of active formatting elements, then there
         * >    is nothing to reconstruct; stop this algorithm.
         * > 2. If the last (most recently added) entry in the list of active formatting elements
         * >    is a marker, or if it is an element that is in the stack of open elements, then
         * >    there is nothing to reconstruct; stop this algorithm.
         */
        let is_open = |index: usize| match formatting.get(index) {
            Some(entry) => match entry.element() {
                Some(element) => self.state.stack.contains_node(element),
                None => true,
            },
            None => true,
        };

        let Some(last) = formatting.len().checked_sub(1) else {
            return;
        };
        if is_open(last) {
            return;
        }

        /*
         * > 3. Let entry be the last (most recently added) element in the list of active
         * >    formatting elements.
         * > 4. Rewind: If there are no entries before entry in the list of active formatting
         * >    elements, then jump to the step labeled create.
         * > 5. Let entry be the entry one earlier than entry in the list of active formatting
         * >    elements.
         * > 6. If entry is neither a marker nor an element that is also in the stack of open
         * >    elements, go to the step labeled rewind.
         * > 7. Advance: Let entry be the element one later than entry in the list of active
         * >    formatting elements.
         */
        let mut first = last;
        while first > 0 && !is_open(first - 1) {
            first -= 1;
        }

        /*
         * > 8. Create: Insert an HTML element for the token for which the element entry was
         * >    created, to obtain new element.
         * > 9. Replace the entry for entry in the list with an entry for new element.
         * > 10. If the entry for new element in the list of active formatting elements is not
         * >     the last entry in the list, return to the step labeled advance.
         */
        for index in first..=last {
            let Some(entry) = self
                .state
                .formatting
                .get(index)
                .and_then(|entry| entry.element())
                .cloned()
            else {
                continue;
            };
            if let Some(copy) = self.insert_copy_of(&entry) {
                self.state.formatting.replace_at(index, copy);
            }
        }
    }

    /// Closes elements that have implied end tags.
    ///
    /// > while the current node is a dd element, a dt element, an li element,
    /// > an optgroup element, an option element, a p element, an rb element,
    /// > an rp element, an rt element, or an rtc element,
    /// > the UA must pop the current node off the stack of open elements.
    ///
    /// @see https://html.spec.whatwg.org/#generate-implied-end-tags
    pub(super) fn generate_implied_end_tags(&mut self, except_for_this_element: Option<&ElementName>) {
        while let Some(current) = self.current_node() {
            let implied = matches!(
                current.html_group(),
                Some(
                    DispatchGroup::DdOrDt
                        | DispatchGroup::Li
                        | DispatchGroup::Optgroup
                        | DispatchGroup::Option
                        | DispatchGroup::P
                        | DispatchGroup::RbOrRtc
                        | DispatchGroup::RtOrRp
                )
            );
            let excepted = except_for_this_element
                .map(|name| current.is_html_named(name))
                .unwrap_or(false);
            if !implied || excepted {
                return;
            }
            self.pop();
        }
    }

    /// Closes elements that have implied end tags, thoroughly.
    ///
    /// @see https://html.spec.whatwg.org/#generate-all-implied-end-tags-thoroughly
    pub(super) fn generate_implied_end_tags_thoroughly(&mut self) {
        while let Some(current) = self.current_node() {
            match current.html_group() {
                Some(
                    DispatchGroup::Caption
                    | DispatchGroup::Colgroup
                    | DispatchGroup::DdOrDt
                    | DispatchGroup::Li
                    | DispatchGroup::Optgroup
                    | DispatchGroup::Option
                    | DispatchGroup::P
                    | DispatchGroup::RbOrRtc
                    | DispatchGroup::RtOrRp
                    | DispatchGroup::TbodyOrTheadOrTfoot
                    | DispatchGroup::TdOrTh
                    | DispatchGroup::Tr,
                ) => {
                    self.pop();
                }
                _ => return,
            }
        }
    }

    /// Closes a P element.
    ///
    /// > Generate implied end tags, except for p elements.
    /// > If the current node is not a p element, then this is a parse error.
    /// > Pop elements from the stack of open elements until a p element has been popped from the stack.
    ///
    /// @see https://html.spec.whatwg.org/#close-a-p-element
    pub(super) fn close_a_p_element(&mut self) {
        let p = ElementName::for_tag(TagName::P);
        self.generate_implied_end_tags(Some(&p));
        if !self.current_node_is(TagName::P) {
            self.parse_error(ParseErrorKind::MisnestedEndTag(p.name().clone()));
        }
        self.pop_until(TagName::P);
    }

    /// Runs the "close the cell" algorithm.
    ///
    /// > 1. Generate implied end tags.
    /// > 2. If the current node is not now a td element or a th element, then this is a parse error.
    /// > 3. Pop elements from the stack of open elements stack until a td element or a th element
    /// >    has been popped from the stack.
    /// > 4. Clear the list of active formatting elements up to the last marker.
    /// > 5. Switch the insertion mode to "in row".
    ///
    /// @see https://html.spec.whatwg.org/#close-the-cell
    pub(super) fn close_the_cell(&mut self) {
        self.generate_implied_end_tags(None);
        let is_cell = self
            .current_node()
            .map(|node| node.html_group() == Some(DispatchGroup::TdOrTh))
            .unwrap_or(false);
        if !is_cell {
            let name = self.current_name();
            self.parse_error(ParseErrorKind::MisnestedEndTag(name));
        }
        while let Some(popped) = self.pop() {
            if popped.html_group() == Some(DispatchGroup::TdOrTh) {
                break;
            }
        }
        self.state.formatting.clear_up_to_last_marker();
        self.set_mode(InsertionMode::IN_ROW);
    }

    /// > When the steps above require the UA to clear the stack back to a table context, it
    /// > means that the UA must, while the current node is not a table, template, or html
    /// > element, pop elements from the stack of open elements.
    pub(super) fn clear_the_stack_back_to_a_table_context(&mut self) {
        self.clear_the_stack_back_to(|group| {
            matches!(group, DispatchGroup::Table | DispatchGroup::Template | DispatchGroup::Html)
        });
    }

    /// > ...while the current node is not a tbody, tfoot, thead, template, or html element...
    pub(super) fn clear_the_stack_back_to_a_table_body_context(&mut self) {
        self.clear_the_stack_back_to(|group| {
            matches!(
                group,
                DispatchGroup::TbodyOrTheadOrTfoot | DispatchGroup::Template | DispatchGroup::Html
            )
        });
    }

    /// > ...while the current node is not a tr, template, or html element...
    pub(super) fn clear_the_stack_back_to_a_table_row_context(&mut self) {
        self.clear_the_stack_back_to(|group| {
            matches!(group, DispatchGroup::Tr | DispatchGroup::Template | DispatchGroup::Html)
        });
    }

    fn clear_the_stack_back_to(&mut self, stop: impl Fn(DispatchGroup) -> bool) {
        while let Some(current) = self.current_node() {
            if current.html_group().map(&stop).unwrap_or(false) {
                return;
            }
            self.pop();
        }
    }

    /// Runs the reset the insertion mode appropriately algorithm.
    ///
    /// @see https://html.spec.whatwg.org/multipage/parsing.html#reset-the-insertion-mode-appropriately
    pub(super) fn reset_insertion_mode_appropriately(&mut self) {
        let mode = self.appropriate_insertion_mode();
        match mode {
            Some(mode) => self.set_mode(mode),
            None => {
                self.bail(TreeBuilderError::InvariantViolation(
                    "template insertion mode stack is empty",
                ));
            }
        }
    }

    fn appropriate_insertion_mode(&self) -> Option<InsertionMode> {
        let stack = &self.state.stack;

        /*
         * > 1. Let _last_ be false.
         * > 2. Let _node_ be the last node in the stack of open elements.
         */
        for (index, node) in stack.iter().enumerate().rev() {
            /*
             * > 3. _Loop_: If _node_ is the first node in the stack of open elements, then set _last_
             * >            to true, and, if the parser was created as part of the HTML fragment parsing
             * >            algorithm (fragment case), set node to the context element passed to
             * >            that algorithm.
             */
            let last = index == 0;
            let group = match (&self.fragment, last) {
                (Some(fragment), true) if fragment.namespace == Namespace::Html => {
                    Some(fragment.name.group())
                }
                (Some(_), true) => None,
                _ => node.html_group(),
            };

            match group {
                /*
                 * > 4. If node is a `select` element, run these substeps:
                 * >   1. If _last_ is true, jump to the step below labeled done.
                 * >   2. Let _ancestor_ be _node_.
                 * >   3. _Loop_: If _ancestor_ is the first node in the stack of open elements,
                 * >      jump to the step below labeled done.
                 * >   4. Let ancestor be the node before ancestor in the stack of open elements.
                 * >   5. If _ancestor_ is a `template` node, jump to the step below labeled _done_.
                 * >   6. If _ancestor_ is a `table` node, switch the insertion mode to
                 * >      "in select in table" and return.
                 * >   7. Jump back to the step labeled _loop_.
                 * >   8. _Done_: Switch the insertion mode to "in select" and return.
                 */
                Some(DispatchGroup::Select) => {
                    if !last {
                        for ancestor in stack.iter().take(index).rev() {
                            if ancestor.is_html(TagName::TEMPLATE) {
                                break;
                            }
                            if ancestor.is_html(TagName::TABLE) {
                                return Some(InsertionMode::IN_SELECT_IN_TABLE);
                            }
                        }
                    }
                    return Some(InsertionMode::IN_SELECT);
                }

                /*
                 * > 5. If _node_ is a `td` or `th` element and _last_ is false, then switch the
                 * >    insertion mode to "in cell" and return.
                 */
                Some(DispatchGroup::TdOrTh) if !last => return Some(InsertionMode::IN_CELL),

                /*
                 * > 6. If _node_ is a `tr` element, then switch the insertion mode to "in row"
                 * >    and return.
                 */
                Some(DispatchGroup::Tr) => return Some(InsertionMode::IN_ROW),

                /*
                 * > 7. If _node_ is a `tbody`, `thead`, or `tfoot` element, then switch the
                 * >    insertion mode to "in table body" and return.
                 */
                Some(DispatchGroup::TbodyOrTheadOrTfoot) => {
                    return Some(InsertionMode::IN_TABLE_BODY)
                }

                /*
                 * > 8. If _node_ is a `caption` element, then switch the insertion mode to
                 * >    "in caption" and return.
                 */
                Some(DispatchGroup::Caption) => return Some(InsertionMode::IN_CAPTION),

                /*
                 * > 9. If _node_ is a `colgroup` element, then switch the insertion mode to
                 * >    "in column group" and return.
                 */
                Some(DispatchGroup::Colgroup) => return Some(InsertionMode::IN_COLUMN_GROUP),

                /*
                 * > 10. If _node_ is a `table` element, then switch the insertion mode to
                 * >     "in table" and return.
                 */
                Some(DispatchGroup::Table) => return Some(InsertionMode::IN_TABLE),

                /*
                 * > 11. If _node_ is a `template` element, then switch the insertion mode to the
                 * >     current template insertion mode and return.
                 */
                Some(DispatchGroup::Template) => return self.state.template_modes.last().copied(),

                /*
                 * > 12. If _node_ is a `head` element and _last_ is false, then switch the
                 * >     insertion mode to "in head" and return.
                 */
                Some(DispatchGroup::Head) if !last => return Some(InsertionMode::IN_HEAD),

                /*
                 * > 13. If _node_ is a `body` element, then switch the insertion mode to "in body"
                 * >     and return.
                 */
                Some(DispatchGroup::Body) => return Some(self.state.body_mode()),

                /*
                 * > 14. If _node_ is a `frameset` element, then switch the insertion mode to
                 * >     "in frameset" and return. (fragment case)
                 */
                Some(DispatchGroup::Frameset) => return Some(InsertionMode::IN_FRAMESET),

                /*
                 * > 15. If _node_ is an `html` element, run these substeps:
                 * >     1. If the head element pointer is null, switch the insertion mode to
                 * >        "before head" and return. (fragment case)
                 * >     2. Otherwise, the head element pointer is not null, switch the insertion
                 * >        mode to "after head" and return.
                 */
                Some(DispatchGroup::Html) => {
                    return Some(match self.state.head_element {
                        None => InsertionMode::BEFORE_HEAD,
                        Some(_) => InsertionMode::AFTER_HEAD,
                    })
                }

                _ => {}
            }
        }

        /*
         * > 16. If _last_ is true, then switch the insertion mode to "in body"
         * >     and return. (fragment case)
         */
        Some(self.state.body_mode())
    }

    /// Runs the adoption agency algorithm.
    ///
    /// Returns `false` when the end tag must instead be handled by the
    /// "any other end tag" steps.
    ///
    /// @see https://html.spec.whatwg.org/#adoption-agency-algorithm
    pub(super) fn run_adoption_agency_algorithm(&mut self, subject: &ElementName) -> bool {
        /*
         * > 2. If the current node is an HTML element whose tag name is subject, and
         * >    the current node is not in the list of active formatting elements, then
         * >    pop the current node off the stack of open elements and return.
         */
        if let Some(current) = self.current_node() {
            if current.is_html_named(subject) && !self.state.formatting.contains(current) {
                self.pop();
                return true;
            }
        }

        /*
         * > 3. Let outer loop counter be 0.
         * > 4. While true:
         * >    1. If outer loop counter is greater than or equal to 8, then return.
         * >    2. Increment outer loop counter by 1.
         */
        for outer_loop_counter in 1..=ADOPTION_AGENCY_OUTER_LOOP_LIMIT {
            #[cfg(test)]
            {
                self.adoption_agency_outer_loops = outer_loop_counter;
            }
            log::debug!(
                target: "html5.tree_builder",
                "adoption agency for </{}>, iteration {}",
                subject.name(),
                outer_loop_counter
            );

            /*
             * > 3. Let formatting element be the last element in the list of active formatting
             * >    elements that:
             * >      - is between the end of the list and the last marker in the list, if any, or
             * >        the start of the list otherwise,
             * >      - and has the tag name subject.
             * >
             * >    If there is no such element, then return and instead act as described in the
             * >    "any other end tag" entry above.
             */
            let Some(formatting_list_pos) =
                self.state.formatting.find_last_between_top_and_marker(subject)
            else {
                return false;
            };
            let Some(formatting_element) = self
                .state
                .formatting
                .get(formatting_list_pos)
                .and_then(|entry| entry.element())
                .cloned()
            else {
                return false;
            };

            /*
             * > 4. If formatting element is not in the stack of open elements, then this is a
             * >    parse error; remove the element from the list, and return.
             */
            let Some(formatting_stack_pos) = self.state.stack.position_of(&formatting_element)
            else {
                self.parse_error(ParseErrorKind::FormattingElementNotOpen(
                    subject.name().clone(),
                ));
                self.state.formatting.remove_at(formatting_list_pos);
                return true;
            };

            /*
             * > 5. If formatting element is in the stack of open elements, but the element is not
             * >    in scope, then this is a parse error; return.
             */
            let in_scope = self
                .state
                .stack
                .find_last_in_scope_matching(Scope::Default, |item| {
                    std::ptr::eq(item, Rc::as_ptr(&formatting_element))
                })
                .is_some();
            if !in_scope {
                self.parse_error(ParseErrorKind::FormattingElementNotInScope(
                    subject.name().clone(),
                ));
                return true;
            }

            /*
             * > 6. If formatting element is not the current node, this is a parse error.
             * >    (But do not return.)
             */
            if formatting_stack_pos + 1 != self.state.stack.len() {
                self.parse_error(ParseErrorKind::MisnestedEndTag(subject.name().clone()));
            }

            /*
             * > 7. Let furthest block be the topmost node in the stack of open elements that is
             * >    lower in the stack than formatting element, and is an element in the special
             * >    category. There might not be one.
             */
            let furthest_block_pos = self
                .state
                .stack
                .iter()
                .enumerate()
                .skip(formatting_stack_pos + 1)
                .find(|(_, entry)| entry.is_special())
                .map(|(index, _)| index);

            /*
             * > 8. If there is no furthest block, then the UA must first pop all the nodes from
             * >    the bottom of the stack of open elements, from the current node up to and
             * >    including formatting element, then remove formatting element from the list of
             * >    active formatting elements, and finally return.
             */
            let Some(furthest_block_pos) = furthest_block_pos else {
                self.pop_to_length(formatting_stack_pos);
                self.state.formatting.remove(&formatting_element);
                return true;
            };

            /*
             * > 9. Let common ancestor be the element immediately above formatting element in the
             * >    stack of open elements.
             */
            let Some(common_ancestor) = formatting_stack_pos
                .checked_sub(1)
                .and_then(|pos| self.state.stack.get(pos))
                .cloned()
            else {
                self.bail(TreeBuilderError::InvariantViolation(
                    "formatting element at the root of the stack",
                ));
                return true;
            };
            let Some(furthest_block) = self.state.stack.get(furthest_block_pos).cloned() else {
                return true;
            };

            /*
             * > 10. Let a bookmark note the position of formatting element in the list of active
             * >     formatting elements relative to the elements on either side of it in the list.
             */
            let mut bookmark = formatting_list_pos;

            /*
             * > 11. Let node and last node be furthest block.
             */
            let mut node_pos = furthest_block_pos;
            let mut last_node = Rc::clone(&furthest_block);

            /*
             * > 12. Let inner loop counter be 0.
             * > 13. While true:
             */
            let mut inner_loop_counter = 0;
            loop {
                /*
                 * > 1. Increment inner loop counter by 1.
                 * > 2. Let node be the element immediately above node in the stack of open
                 * >    elements, or if node is no longer in the stack of open elements (e.g.
                 * >    because it got removed by this algorithm), the element that was immediately
                 * >    above node in the stack of open elements before node was removed.
                 */
                inner_loop_counter += 1;
                node_pos -= 1;
                let Some(node) = self.state.stack.get(node_pos).cloned() else {
                    break;
                };

                /*
                 * > 3. If node is formatting element, then break.
                 */
                if Rc::ptr_eq(&node, &formatting_element) {
                    break;
                }

                /*
                 * > 4. If inner loop counter is greater than 3 and node is in the list of active
                 * >    formatting elements, then remove node from the list of active formatting
                 * >    elements.
                 */
                let mut node_list_pos = self.state.formatting.position_of(&node);
                if inner_loop_counter > ADOPTION_AGENCY_INNER_LOOP_LIMIT {
                    if let Some(pos) = node_list_pos.take() {
                        self.state.formatting.remove_at(pos);
                        if pos < bookmark {
                            bookmark -= 1;
                        }
                    }
                }

                /*
                 * > 5. If node is not in the list of active formatting elements, then remove node
                 * >    from the stack of open elements and continue.
                 */
                let Some(node_list_pos) = node_list_pos else {
                    self.remove_from_stack(node_pos);
                    continue;
                };

                /*
                 * > 6. Create an element for the token for which the element node was created, in
                 * >    the HTML namespace, with common ancestor as the intended parent; replace the
                 * >    entry for node in the list of active formatting elements with an entry for
                 * >    the new element, replace the entry for node in the stack of open elements
                 * >    with an entry for the new element, and let node be the new element.
                 */
                let empty = Attributes::new();
                let new_node = self.sink.create_element(
                    Namespace::Html,
                    &node.local_name,
                    node.attributes.as_ref().unwrap_or(&empty),
                    None,
                    &common_ancestor.node,
                );
                let new_entry = Rc::new(node.with_node(new_node));
                self.state
                    .formatting
                    .replace_at(node_list_pos, Rc::clone(&new_entry));
                self.state.stack.replace_at(node_pos, Rc::clone(&new_entry));

                /*
                 * > 7. If last node is furthest block, then move the aforementioned bookmark to be
                 * >    immediately after the new node in the list of active formatting elements.
                 */
                if Rc::ptr_eq(&last_node, &furthest_block) {
                    bookmark = node_list_pos + 1;
                }

                /*
                 * > 8. Append last node to node.
                 * > 9. Set last node to node.
                 */
                self.sink.detach_from_parent(&last_node.node);
                self.sink.append_element(&last_node.node, &new_entry.node);
                last_node = new_entry;
            }

            /*
             * > 14. Insert whatever last node ended up being in the previous step at the
             * >     appropriate place for inserting a node, but using common ancestor as the
             * >     override target.
             */
            self.sink.detach_from_parent(&last_node.node);
            let place = self
                .state
                .stack
                .position_of(&common_ancestor)
                .and_then(|index| self.appropriate_place(Some(index)))
                .unwrap_or_else(|| InsertionPlace::AppendTo(common_ancestor.node.clone()));
            self.insert_node_at(&place, &last_node.node);

            /*
             * > 15. Create an element for the token for which formatting element was created, in
             * >     the HTML namespace, with furthest block as the intended parent.
             */
            let empty = Attributes::new();
            let clone_node = self.sink.create_element(
                Namespace::Html,
                &formatting_element.local_name,
                formatting_element.attributes.as_ref().unwrap_or(&empty),
                None,
                &furthest_block.node,
            );
            let clone = Rc::new(formatting_element.with_node(clone_node));

            /*
             * > 16. Take all of the child nodes of furthest block and append them to the element
             * >     created in the last step.
             * > 17. Append that new element to furthest block.
             */
            self.sink
                .append_children_to_new_parent(&furthest_block.node, &clone.node);
            self.sink.append_element(&clone.node, &furthest_block.node);

            /*
             * > 18. Remove formatting element from the list of active formatting elements, and
             * >     insert the new element into the list of active formatting elements at the
             * >     position of the aforementioned bookmark.
             */
            if let Some(pos) = self.state.formatting.position_of(&formatting_element) {
                self.state.formatting.remove_at(pos);
                if pos < bookmark {
                    bookmark -= 1;
                }
            }
            let bookmark = bookmark.min(self.state.formatting.len());
            self.state.formatting.insert_at(bookmark, Rc::clone(&clone));

            /*
             * > 19. Remove formatting element from the stack of open elements, and insert the new
             * >     element into the stack of open elements immediately below the position of
             * >     furthest block in that stack.
             */
            if let Some(pos) = self.state.stack.position_of(&formatting_element) {
                self.state.stack.remove_at(pos);
            }
            match self.state.stack.position_of(&furthest_block) {
                Some(pos) => self.state.stack.insert_at(pos + 1, clone),
                None => self.state.stack.push(clone),
            }
        }

        true
    }

    /// > Any other end tag
    /// >
    /// > Run these steps:
    /// >
    /// > 1. Initialize node to be the current node (the bottommost node of the stack).
    /// > 2. Loop: If node is an HTML element with the same tag name as the token, then:
    /// >    1. Generate implied end tags, except for HTML elements with the same tag name as the token.
    /// >    2. If node is not the current node, then this is a parse error.
    /// >    3. Pop all the nodes from the current node up to node, including node, then stop these steps.
    /// > 3. Otherwise, if node is in the special category, then this is a parse error; ignore the token,
    /// >    and return.
    /// > 4. Set node to the previous entry in the stack of open elements.
    /// > 5. Return to the step labeled loop.
    pub(super) fn any_other_end_tag(&mut self, name: &ElementName) {
        let mut target = None;
        for (index, node) in self.state.stack.iter().enumerate().rev() {
            if node.is_html_named(name) {
                target = Some(index);
                break;
            }
            if node.is_special() {
                break;
            }
        }

        let Some(index) = target else {
            self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
            return;
        };

        self.generate_implied_end_tags(Some(name));
        if index + 1 != self.state.stack.len() {
            self.parse_error(ParseErrorKind::MisnestedEndTag(name.name().clone()));
        }
        self.pop_to_length(index);
    }

    /// Closes an element by name once it is known to be in scope.
    ///
    /// > 1. Generate implied end tags.
    /// > 2. If the current node is not an HTML element with the same tag name as that of the
    /// >    token, then this is a parse error.
    /// > 3. Pop elements from the stack of open elements until an HTML element with the same
    /// >    tag name as the token has been popped from the stack.
    pub(super) fn close_element_in_scope(&mut self, name: &ElementName, except_self: bool) {
        self.generate_implied_end_tags(except_self.then_some(name));
        let is_current = self
            .current_node()
            .map(|node| node.is_html_named(name))
            .unwrap_or(false);
        if !is_current {
            self.parse_error(ParseErrorKind::MisnestedEndTag(name.name().clone()));
        }
        while let Some(popped) = self.pop() {
            if popped.is_html_named(name) {
                break;
            }
        }
    }

    /// The generic raw text element parsing algorithm and the generic RCDATA
    /// element parsing algorithm.
    ///
    /// > 1. Insert an HTML element for the token.
    /// > 2. If the algorithm that was invoked is the generic raw text element parsing algorithm,
    /// >    switch the tokenizer to the RAWTEXT state; otherwise the algorithm invoked was the
    /// >    generic RCDATA element parsing algorithm, switch the tokenizer to the RCDATA state.
    /// > 3. Set the original insertion mode to the current insertion mode.
    /// > 4. Then, switch the insertion mode to "text".
    ///
    /// @see https://html.spec.whatwg.org/#generic-raw-text-element-parsing-algorithm
    pub(super) fn parse_generic_text_element(&mut self, tag: &Tag, state: LexicalState) {
        self.insert_html_element(tag);
        self.switch_lexical_state(state, Some(tag.name.clone()));
        self.state.original_mode = Some(self.state.mode);
        self.set_mode(InsertionMode::TEXT);
    }

    /// The script start tag as handled by the "in head" rules.
    pub(super) fn insert_script_element(&mut self, tag: &Tag) {
        self.parse_generic_text_element(tag, LexicalState::ScriptData);
    }

    /// Name of the current node, for diagnostics.
    pub(super) fn current_name(&self) -> Atom {
        self.current_node()
            .map(|node| node.pop_name.clone())
            .unwrap_or_else(|| Atom::from_static("#document"))
    }

    /// Reports the open elements that are not allowed to be left open.
    ///
    /// > If there is a node in the stack of open elements that is not either a dd element,
    /// > a dt element, an li element, an optgroup element, an option element, a p element,
    /// > an rb element, an rp element, an rt element, an rtc element, a tbody element, a td
    /// > element, a tfoot element, a th element, a thead element, a tr element, the body
    /// > element, or the html element, then this is a parse error.
    pub(super) fn report_unclosed_elements(&mut self) {
        let names: Vec<Atom> = self
            .state
            .stack
            .iter()
            .filter(|entry| !entry.has_optional_end_tag())
            .map(|entry| entry.pop_name.clone())
            .collect();
        if !names.is_empty() {
            self.parse_error(ParseErrorKind::UnclosedElements { names });
        }
    }

    /// > Stop parsing.
    ///
    /// Pops every remaining element, including the root.
    pub(super) fn stop_parsing(&mut self) -> Step {
        log::trace!(target: "html5.tree_builder", "stop parsing");
        self.pop_to_length(0);
        Step::Done
    }

    /// End of input in a mode that may hold templates.
    ///
    /// > If there is no template element on the stack of open elements, then stop parsing.
    /// > (fragment case)
    /// >
    /// > Otherwise, this is a parse error.
    /// >
    /// > Pop elements from the stack of open elements until a template element has been popped
    /// > from the stack.
    /// >
    /// > Clear the list of active formatting elements up to the last marker.
    /// >
    /// > Pop the current template insertion mode off the stack of template insertion modes.
    /// >
    /// > Reset the insertion mode appropriately.
    /// >
    /// > Reprocess the token.
    pub(super) fn eof_with_templates(&mut self) -> Step {
        if !self.state.stack.contains(TagName::TEMPLATE) {
            self.report_unclosed_elements();
            return self.stop_parsing();
        }

        self.report_unclosed_elements();
        self.pop_until(TagName::TEMPLATE);
        self.state.formatting.clear_up_to_last_marker();
        if self.state.template_modes.pop().is_none() {
            return self.bail(TreeBuilderError::InvariantViolation(
                "template insertion mode stack is empty",
            ));
        }
        self.reset_insertion_mode_appropriately();
        Step::Reprocess(self.state.mode, Token::Eof)
    }

    /// Merges attributes of a stray `<html>` or `<body>` start tag into an open element.
    pub(super) fn merge_attributes_into(&mut self, index: usize, attributes: &Attributes) {
        if attributes.is_empty() {
            return;
        }
        if let Some(entry) = self.state.stack.get(index) {
            let node = entry.node.clone();
            self.sink.add_attributes_to_element(&node, attributes);
        }
    }
}
